use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolResult};
use crate::store::TrackingStore;

/// How much of the feature checklist is passing and how much has findings.
pub struct CoverageGetStatsTool;

#[async_trait]
impl Tool for CoverageGetStatsTool {
    fn name(&self) -> &'static str {
        "coverage_get_stats"
    }

    fn description(&self) -> &'static str {
        "Get test coverage statistics: how many features exist and pass, \
         how many have associated findings, and the overall coverage percentage."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value, store: &TrackingStore) -> ToolResult {
        match store.coverage_stats().await {
            Ok(stats) => ToolResult::success(json!(stats)),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewFeature;

    #[tokio::test]
    async fn test_empty_store_has_zero_coverage() {
        let store = TrackingStore::in_memory().unwrap();
        let result = CoverageGetStatsTool.execute(json!({}), &store).await;
        assert_eq!(result.payload["coverage_percentage"], 0.0);
        assert_eq!(result.payload["total_features"], 0);
    }

    #[tokio::test]
    async fn test_one_of_four_passing_is_25_percent() {
        let store = TrackingStore::in_memory().unwrap();
        for i in 0..4 {
            store
                .create_feature(NewFeature {
                    priority: i,
                    category: "core".to_string(),
                    name: format!("Feature {}", i),
                    description: "works".to_string(),
                    steps: vec!["check".to_string()],
                    passes: i == 0,
                    in_progress: false,
                })
                .await
                .unwrap();
        }
        let result = CoverageGetStatsTool.execute(json!({}), &store).await;
        assert_eq!(result.payload["total_features"], 4);
        assert_eq!(result.payload["passing_features"], 1);
        assert_eq!(result.payload["coverage_percentage"], 25.0);
    }
}
