//! Line-delimited JSON-RPC 2.0 over stdio, speaking the subset of MCP the
//! agent needs to discover and call tools.
//!
//! Each request is one JSON object per line; each response is written as one
//! line. Notifications (no `id`) get no response. Nothing but protocol frames
//! is ever written to the output stream.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::tools::ToolSurface;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "scout";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    jsonrpc: Option<String>,
    /// Absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct Response {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl Response {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Handle one frame. Returns the serialized response, or `None` for notifications.
pub async fn handle_message(tools: &ToolSurface, line: &str) -> Option<String> {
    let response = match serde_json::from_str::<Value>(line) {
        Err(e) => Some(Response::err(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))),
        Ok(raw) => {
            let id = raw.get("id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Request>(raw) {
                Err(e) => Some(Response::err(id, INVALID_REQUEST, format!("Invalid request: {}", e))),
                Ok(req) => dispatch(tools, req).await,
            }
        }
    };
    response.and_then(|r| serde_json::to_string(&r).ok())
}

async fn dispatch(tools: &ToolSurface, req: Request) -> Option<Response> {
    if req.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
        return req
            .id
            .map(|id| Response::err(id, INVALID_REQUEST, "Unsupported jsonrpc version"));
    }

    let Some(id) = req.id else {
        debug!(method = %req.method, "MCP notification");
        return None;
    };
    debug!(method = %req.method, "MCP request");

    let response = match req.method.as_str() {
        "initialize" => Response::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        ),
        "ping" => Response::ok(id, json!({})),
        "tools/list" => Response::ok(id, json!({ "tools": tools.definitions() })),
        "tools/call" => match serde_json::from_value::<CallParams>(req.params) {
            Err(e) => Response::err(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            Ok(params) => {
                let result = tools.call(&params.name, params.arguments).await;
                Response::ok(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": result.to_text() }],
                        "isError": result.is_error(),
                    }),
                )
            }
        },
        other => Response::err(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    };
    Some(response)
}

/// Serve frames from `reader` until EOF.
pub async fn serve<R, W>(tools: &ToolSurface, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read MCP frame")? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_message(tools, &line).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    Ok(())
}

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio(tools: ToolSurface) -> Result<()> {
    info!("MCP server ready on stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = serve(&tools, stdin, tokio::io::stdout()).await;
    match &result {
        Ok(()) => info!("MCP client closed the stream"),
        Err(e) => warn!(error = %e, "MCP server stopped"),
    }
    result
}
