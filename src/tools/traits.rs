//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::ToolResult;
use crate::store::TrackingStore;

/// An operation the exploration agent can call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the name the agent calls)
    fn name(&self) -> &'static str;

    /// Human-readable description shown to the agent
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Validate `input` and run the operation. Never panics on malformed input;
    /// every failure comes back as an error payload.
    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult;
}
