//! ToolSurface - the registry of agent-callable tools bound to one store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    CoverageGetStatsTool, ErrorKind, FeatureGetByIdTool, FeatureListForTestingTool,
    FindingGetStatsTool, FindingListTool, FindingReportTool, FindingUpdateStatusTool, Tool,
    ToolResult,
};
use crate::store::TrackingStore;

/// Tool definition as published to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Named tools over a shared [`TrackingStore`].
pub struct ToolSurface {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
    store: TrackingStore,
}

impl ToolSurface {
    /// Surface with every finding, feature and coverage tool.
    pub fn standard(store: TrackingStore) -> Self {
        let mut surface = Self::empty(store);

        // Findings
        surface.add_tool(Box::new(FindingReportTool));
        surface.add_tool(Box::new(FindingGetStatsTool));
        surface.add_tool(Box::new(FindingListTool));
        surface.add_tool(Box::new(FindingUpdateStatusTool));

        // Features and coverage (read-only)
        surface.add_tool(Box::new(FeatureListForTestingTool));
        surface.add_tool(Box::new(FeatureGetByIdTool));
        surface.add_tool(Box::new(CoverageGetStatsTool));

        surface
    }

    /// Create an empty surface (for testing)
    pub fn empty(store: TrackingStore) -> Self {
        Self {
            tools: BTreeMap::new(),
            store,
        }
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn store(&self) -> &TrackingStore {
        &self.store
    }

    /// Definitions sorted by tool name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Call a tool by name. Unknown names produce an `unknown_tool` error payload.
    pub async fn call(&self, name: &str, input: Value) -> ToolResult {
        debug!(tool = name, "ToolSurface::call");
        match self.tools.get(name) {
            Some(tool) => tool.execute(input, &self.store).await,
            None => ToolResult::error(ErrorKind::UnknownTool, format!("Unknown tool: {}", name)),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn surface() -> ToolSurface {
        ToolSurface::standard(TrackingStore::in_memory().unwrap())
    }

    #[test]
    fn test_standard_surface_has_all_tools() {
        let surface = surface();
        assert_eq!(
            surface.tool_names(),
            vec![
                "coverage_get_stats",
                "feature_get_by_id",
                "feature_list_for_testing",
                "finding_get_stats",
                "finding_list",
                "finding_report",
                "finding_update_status",
            ]
        );
    }

    #[test]
    fn test_definitions_publish_object_schemas() {
        let defs = surface().definitions();
        assert_eq!(defs.len(), 7);
        for def in &defs {
            assert!(!def.description.is_empty(), "{} lacks a description", def.name);
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }
        let json = serde_json::to_value(&defs[0]).unwrap();
        assert!(json.get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = surface().call("finding_delete", json!({})).await;
        assert_eq!(result.error_kind, Some(ErrorKind::UnknownTool));
        assert_eq!(result.payload["error"], "Unknown tool: finding_delete");
    }

    #[tokio::test]
    async fn test_call_round_trips_through_store() {
        let surface = surface();
        let report = surface
            .call(
                "finding_report",
                json!({
                    "severity": "low",
                    "category": "accessibility",
                    "title": "Missing alt text",
                    "description": "Logo image has no alt attribute",
                    "steps_to_reproduce": ["open /", "inspect logo"]
                }),
            )
            .await;
        assert!(!report.is_error(), "{}", report.to_text());

        let stats = surface.call("finding_get_stats", json!({})).await;
        assert_eq!(stats.payload["by_category"]["accessibility"], 1);
    }
}
