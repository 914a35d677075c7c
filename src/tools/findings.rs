//! Finding tools: report, list, update status, stats.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolResult, parse_args, parse_enum, parse_optional_enum};
use crate::store::{
    Category, DEFAULT_LIST_LIMIT, FindingFilter, FindingStatus, NewFinding, Severity,
    TrackingStore,
};

/// Report a new issue found during testing.
pub struct FindingReportTool;

#[derive(Debug, Deserialize)]
struct ReportArgs {
    severity: String,
    category: String,
    title: String,
    description: String,
    steps_to_reproduce: Vec<String>,
    #[serde(default)]
    expected_behavior: Option<String>,
    #[serde(default)]
    actual_behavior: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    related_feature_id: Option<i64>,
    #[serde(default)]
    suggested_fix: Option<String>,
    #[serde(default)]
    screenshot_path: Option<String>,
}

impl ReportArgs {
    fn into_new_finding(self) -> Result<NewFinding, ToolResult> {
        let severity: Severity = parse_enum(&self.severity)?;
        let category: Category = parse_enum(&self.category)?;
        let mut finding = NewFinding::new(
            severity,
            category,
            self.title,
            self.description,
            self.steps_to_reproduce,
        );
        finding.expected_behavior = self.expected_behavior;
        finding.actual_behavior = self.actual_behavior;
        finding.url = self.url;
        finding.related_feature_id = self.related_feature_id;
        finding.suggested_fix = self.suggested_fix;
        finding.screenshot_path = self.screenshot_path;
        Ok(finding)
    }
}

#[async_trait]
impl Tool for FindingReportTool {
    fn name(&self) -> &'static str {
        "finding_report"
    }

    fn description(&self) -> &'static str {
        "Report a new issue found during testing. \
         Severity: critical (crashes, data loss, security holes), high (major feature broken), \
         medium (minor bugs, confusing UX), low (cosmetic). \
         Category: functional, ux, edge-case, security, accessibility."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "severity": {
                    "type": "string",
                    "description": "Issue severity: critical, high, medium, or low"
                },
                "category": {
                    "type": "string",
                    "description": "Issue category: functional, ux, edge-case, security, or accessibility"
                },
                "title": {"type": "string", "description": "Brief title describing the issue"},
                "description": {"type": "string", "description": "Detailed description of the issue"},
                "steps_to_reproduce": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": 1,
                    "description": "List of steps to reproduce the issue"
                },
                "expected_behavior": {"type": "string", "description": "What should have happened"},
                "actual_behavior": {"type": "string", "description": "What actually happened"},
                "url": {"type": "string", "description": "URL where the issue was found"},
                "related_feature_id": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "ID of related feature if applicable"
                },
                "suggested_fix": {"type": "string", "description": "Optional suggestion for how to fix"},
                "screenshot_path": {"type": "string", "description": "Path to screenshot if captured"}
            },
            "required": ["severity", "category", "title", "description", "steps_to_reproduce"]
        })
    }

    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult {
        let finding = match parse_args::<ReportArgs>(input).and_then(ReportArgs::into_new_finding) {
            Ok(finding) => finding,
            Err(err) => return err,
        };

        match store.create_finding(finding).await {
            Ok(created) => ToolResult::success(json!({
                "message": format!("Finding #{} reported successfully", created.id),
                "finding": created,
            })),
            Err(e) => e.into(),
        }
    }
}

/// Aggregate counts over all findings.
pub struct FindingGetStatsTool;

#[async_trait]
impl Tool for FindingGetStatsTool {
    fn name(&self) -> &'static str {
        "finding_get_stats"
    }

    fn description(&self) -> &'static str {
        "Get statistics about test findings: totals by severity, status and category, \
         plus the number of open critical findings."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _input: Value, store: &TrackingStore) -> ToolResult {
        match store.finding_stats().await {
            Ok(stats) => ToolResult::success(json!(stats)),
            Err(e) => e.into(),
        }
    }
}

/// List findings, most severe first.
pub struct FindingListTool;

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIST_LIMIT
}

impl ListArgs {
    fn filter(&self) -> Result<FindingFilter, ToolResult> {
        Ok(FindingFilter {
            status: parse_optional_enum(self.status.as_deref())?,
            severity: parse_optional_enum(self.severity.as_deref())?,
            category: parse_optional_enum(self.category.as_deref())?,
        })
    }
}

#[async_trait]
impl Tool for FindingListTool {
    fn name(&self) -> &'static str {
        "finding_list"
    }

    fn description(&self) -> &'static str {
        "List test findings with optional filtering by status, severity and category. \
         Sorted by severity (critical first), then by creation date."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "description": "Filter by status: open, in_progress, fixed, wont_fix"
                },
                "severity": {
                    "type": "string",
                    "description": "Filter by severity: critical, high, medium, low"
                },
                "category": {"type": "string", "description": "Filter by category"},
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 100,
                    "default": DEFAULT_LIST_LIMIT,
                    "description": "Max findings to return"
                }
            }
        })
    }

    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult {
        let (filter, limit) = match parse_args::<ListArgs>(input)
            .and_then(|args| args.filter().map(|filter| (filter, args.limit)))
        {
            Ok(parsed) => parsed,
            Err(err) => return err,
        };

        match store.list_findings(filter, limit).await {
            Ok(findings) => ToolResult::success(json!({
                "count": findings.len(),
                "findings": findings,
            })),
            Err(e) => e.into(),
        }
    }
}

/// Move a finding to a new status.
pub struct FindingUpdateStatusTool;

#[derive(Debug, Deserialize)]
struct UpdateStatusArgs {
    finding_id: i64,
    status: String,
}

#[async_trait]
impl Tool for FindingUpdateStatusTool {
    fn name(&self) -> &'static str {
        "finding_update_status"
    }

    fn description(&self) -> &'static str {
        "Update the status of a test finding (open, in_progress, fixed, wont_fix). \
         Use this when a finding has been addressed or is being worked on."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "finding_id": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "ID of the finding to update"
                },
                "status": {
                    "type": "string",
                    "description": "New status: open, in_progress, fixed, wont_fix"
                }
            },
            "required": ["finding_id", "status"]
        })
    }

    async fn execute(&self, input: Value, store: &TrackingStore) -> ToolResult {
        let (id, status) = match parse_args::<UpdateStatusArgs>(input).and_then(|args| {
            parse_enum::<FindingStatus>(&args.status).map(|status| (args.finding_id, status))
        }) {
            Ok(parsed) => parsed,
            Err(err) => return err,
        };

        match store.update_finding_status(id, status).await {
            Ok(updated) => ToolResult::success(json!({
                "message": format!("Finding #{} status updated to {}", id, status),
                "finding": updated,
            })),
            Err(e) => e.into(),
        }
    }
}
