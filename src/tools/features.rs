//! Feature tools: read-only access to the feature checklist.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolResult, parse_args};
use crate::store::TrackingStore;

/// List features to test against, lowest priority number first.
pub struct FeatureListForTestingTool;

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default = "default_include_passing")]
    include_passing: bool,
}

fn default_include_passing() -> bool {
    true
}

#[async_trait]
impl Tool for FeatureListForTestingTool {
    fn name(&self) -> &'static str {
        "feature_list_for_testing"
    }

    fn description(&self) -> &'static str {
        "Get the list of features to test against, ordered by priority. \
         Set include_passing to false to see only features not yet passing."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "include_passing": {
                    "type": "boolean",
                    "default": true,
                    "description": "Include features marked as passing"
                }
            }
        })
    }

    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult {
        let args: ListArgs = match parse_args(input) {
            Ok(args) => args,
            Err(err) => return err,
        };

        match store.list_features(args.include_passing).await {
            Ok(features) => ToolResult::success(json!({
                "count": features.len(),
                "features": features,
            })),
            Err(e) => e.into(),
        }
    }
}

/// Full details of one feature.
pub struct FeatureGetByIdTool;

#[derive(Debug, Deserialize)]
struct GetArgs {
    feature_id: i64,
}

#[async_trait]
impl Tool for FeatureGetByIdTool {
    fn name(&self) -> &'static str {
        "feature_get_by_id"
    }

    fn description(&self) -> &'static str {
        "Get a specific feature by ID, including its verification steps."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "feature_id": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "ID of the feature to get"
                }
            },
            "required": ["feature_id"]
        })
    }

    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult {
        let args: GetArgs = match parse_args(input) {
            Ok(args) => args,
            Err(err) => return err,
        };

        match store.get_feature(args.feature_id).await {
            Ok(feature) => ToolResult::success(json!(feature)),
            Err(e) => e.into(),
        }
    }
}
