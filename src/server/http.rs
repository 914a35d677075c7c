use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StoreError;
use crate::tools::{ErrorKind, ToolResult, ToolSurface};

pub const DEFAULT_PORT: u16 = 3142;

/// Configuration for the reporting server.
pub struct ServerConfig {
    pub port: u16,
    /// Bind to all interfaces and allow any origin.
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            dev_mode: false,
        }
    }
}

pub struct AppState {
    pub tools: ToolSurface,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::BadRequest(msg),
            e @ StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            e => {
                warn!(error = %e, "Reporting request hit a storage failure");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

/// HTTP status for a tool result. Error payloads keep their `kind` field.
fn tool_status(result: &ToolResult) -> StatusCode {
    match result.error_kind {
        None => StatusCode::OK,
        Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::NotFound | ErrorKind::UnknownTool) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Storage) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(call_tool))
        .route("/api/stats", get(finding_stats))
        .route("/api/coverage", get(coverage_stats))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn list_tools(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.tools.definitions())
}

async fn call_tool(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    let input = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let result = state.tools.call(&name, input).await;
    (tool_status(&result), Json(result.payload)).into_response()
}

async fn finding_stats(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.tools.store().finding_stats().await?;
    Ok(Json(stats))
}

async fn coverage_stats(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.tools.store().coverage_stats().await?;
    Ok(Json(stats))
}

/// Serve the reporting API until Ctrl+C.
pub async fn start_server(tools: ToolSurface, config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState { tools });
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, "Reporting server listening");
    println!("Scout reporting API running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewFeature, TrackingStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    fn test_router() -> (Router, TrackingStore) {
        let store = TrackingStore::in_memory().unwrap();
        let state = Arc::new(AppState {
            tools: ToolSurface::standard(store.clone()),
        });
        (build_router(state), store)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_router();
        let resp = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (app, _) = test_router();
        let (status, body) = send(app, get_req("/api/tools")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 7);
        assert!(body[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_report_then_stats() {
        let (app, _) = test_router();
        let (status, body) = send(
            app.clone(),
            post_json(
                "/api/tools/finding_report",
                json!({
                    "severity": "Critical",
                    "category": "security",
                    "title": "Session cookie lacks HttpOnly",
                    "description": "document.cookie exposes the session id",
                    "steps_to_reproduce": ["log in", "run document.cookie in devtools"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Finding #1 reported successfully");

        let (status, stats) = send(app, get_req("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["open_critical"], 1);
    }

    #[tokio::test]
    async fn test_tool_error_statuses() {
        let (app, _) = test_router();
        let (status, body) = send(
            app.clone(),
            post_json("/api/tools/finding_update_status", json!({"finding_id": 5, "status": "fixed"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "not_found");

        let (status, body) = send(
            app.clone(),
            post_json("/api/tools/finding_list", json!({"severity": "extreme"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");

        let (status, body) = send(app, post_json("/api/tools/drop_tables", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_call_without_body_uses_defaults() {
        let (app, _) = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/api/tools/finding_list")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_coverage() {
        let (app, store) = test_router();
        store
            .create_feature(NewFeature {
                category: "auth".to_string(),
                name: "Login".to_string(),
                description: "Users can log in".to_string(),
                steps: vec!["open /login".to_string()],
                priority: 1,
                passes: false,
                in_progress: false,
            })
            .await
            .unwrap();
        let (status, body) = send(app, get_req("/api/coverage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_features"], 1);
        assert_eq!(body["coverage_percentage"], 0.0);
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::validation("bad")),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::NotFound { entity: "Finding", id: 1 }),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::LockPoisoned),
            ApiError::Internal(_)
        ));
    }
}
