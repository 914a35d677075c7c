//! The tool surface: named, validating operations over the tracking store.
//!
//! Tools take a loose JSON object, deserialize it into a typed argument
//! struct, parse enumerated fields case-insensitively, and delegate to
//! [`TrackingStore`](crate::store::TrackingStore). Any failure, including a
//! malformed argument object, comes back as a structured error payload.

mod coverage;
mod features;
mod findings;
mod result;
mod surface;
mod traits;

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use coverage::CoverageGetStatsTool;
pub use features::{FeatureGetByIdTool, FeatureListForTestingTool};
pub use findings::{FindingGetStatsTool, FindingListTool, FindingReportTool, FindingUpdateStatusTool};
pub use result::{ErrorKind, ToolResult};
pub use surface::{ToolDefinition, ToolSurface};
pub use traits::Tool;

/// Deserialize tool arguments. A missing or `null` argument object is treated as `{}`.
pub(crate) fn parse_args<T: DeserializeOwned>(input: Value) -> Result<T, ToolResult> {
    let input = if input.is_null() {
        Value::Object(Default::default())
    } else {
        input
    };
    serde_json::from_value(input)
        .map_err(|e| ToolResult::error(ErrorKind::Validation, format!("Invalid arguments: {}", e)))
}

/// Parse an enumerated field, mapping the parse message into a validation error.
pub(crate) fn parse_enum<T>(raw: &str) -> Result<T, ToolResult>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|msg| ToolResult::error(ErrorKind::Validation, msg))
}

/// Parse an optional filter; absent or blank means "no constraint".
pub(crate) fn parse_optional_enum<T>(raw: Option<&str>) -> Result<Option<T>, ToolResult>
where
    T: FromStr<Err = String>,
{
    match raw {
        Some(value) if !value.trim().is_empty() => parse_enum(value).map(Some),
        _ => Ok(None),
    }
}
