use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::errors::StoreError;

/// Why a tool call failed. Serialized into the `kind` field of error payloads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
    UnknownTool,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::UnknownTool => "unknown_tool",
        }
    }
}

/// Result of a tool execution: always a JSON payload, flagged when it is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub payload: Value,
    pub error_kind: Option<ErrorKind>,
}

impl ToolResult {
    pub fn success(payload: Value) -> Self {
        Self {
            payload,
            error_kind: None,
        }
    }

    /// `{ "error": message, "kind": kind }`
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        debug!(kind = kind.as_str(), %message, "ToolResult::error");
        Self {
            payload: json!({ "error": message, "kind": kind.as_str() }),
            error_kind: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_kind.is_some()
    }

    /// Pretty-printed payload, as handed back to the agent.
    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(&self.payload).unwrap_or_else(|_| self.payload.to_string())
    }
}

impl From<StoreError> for ToolResult {
    fn from(err: StoreError) -> Self {
        if !err.is_recoverable() {
            warn!(error = %err, "Tool call hit a storage failure");
        }
        let kind = match &err {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Storage,
        };
        Self::error(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload_shape() {
        let result = ToolResult::error(ErrorKind::Validation, "Invalid severity 'extreme'");
        assert!(result.is_error());
        assert_eq!(result.payload["error"], "Invalid severity 'extreme'");
        assert_eq!(result.payload["kind"], "validation");
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let not_found: ToolResult = StoreError::NotFound {
            entity: "Feature",
            id: 9,
        }
        .into();
        assert_eq!(not_found.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(not_found.payload["error"], "Feature with ID 9 not found");

        let storage: ToolResult = StoreError::LockPoisoned.into();
        assert_eq!(storage.error_kind, Some(ErrorKind::Storage));
        assert_eq!(storage.payload["kind"], "storage");
    }

    #[test]
    fn test_success_text_is_pretty_json() {
        let result = ToolResult::success(json!({"count": 0, "findings": []}));
        assert!(!result.is_error());
        let text = result.to_text();
        assert!(text.contains('\n'));
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result.payload);
    }
}
