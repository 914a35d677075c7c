use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Priority assigned to features seeded without one. Lower sorts first.
pub const DEFAULT_FEATURE_PRIORITY: i64 = 999;

/// Rank given to a severity value outside the known set when ordering.
pub const UNRANKED_SEVERITY: u8 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Ordering rank, most severe first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!(
                "Invalid severity '{}'. Must be one of: critical, high, medium, low",
                s
            )),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Functional,
    Ux,
    EdgeCase,
    Security,
    Accessibility,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Functional,
        Self::Ux,
        Self::EdgeCase,
        Self::Security,
        Self::Accessibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functional => "functional",
            Self::Ux => "ux",
            Self::EdgeCase => "edge-case",
            Self::Security => "security",
            Self::Accessibility => "accessibility",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "functional" => Ok(Self::Functional),
            "ux" => Ok(Self::Ux),
            "edge-case" => Ok(Self::EdgeCase),
            "security" => Ok(Self::Security),
            "accessibility" => Ok(Self::Accessibility),
            _ => Err(format!(
                "Invalid category '{}'. Must be one of: functional, ux, edge-case, security, accessibility",
                s
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a finding. Any status may move to any other; nothing changes
/// status implicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    #[default]
    Open,
    InProgress,
    Fixed,
    WontFix,
}

impl FindingStatus {
    pub const ALL: [FindingStatus; 4] = [Self::Open, Self::InProgress, Self::Fixed, Self::WontFix];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Fixed => "fixed",
            Self::WontFix => "wont_fix",
        }
    }
}

impl FromStr for FindingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "fixed" => Ok(Self::Fixed),
            "wont_fix" => Ok(Self::WontFix),
            _ => Err(format!(
                "Invalid status '{}'. Must be one of: open, in_progress, fixed, wont_fix",
                s
            )),
        }
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enum column as read back from storage. Rows written by other tools may
/// carry values outside the known set; those are kept verbatim so listings
/// still include them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stored<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: FromStr> Stored<T> {
    pub fn parse(raw: String) -> Self {
        match raw.parse() {
            Ok(value) => Self::Known(value),
            Err(_) => Self::Unrecognized(raw),
        }
    }
}

impl<T> Stored<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unrecognized(_) => None,
        }
    }
}

impl Stored<Severity> {
    pub fn rank(&self) -> u8 {
        self.known().map_or(UNRANKED_SEVERITY, Severity::rank)
    }
}

impl<T: PartialEq> PartialEq<T> for Stored<T> {
    fn eq(&self, other: &T) -> bool {
        self.known() == Some(other)
    }
}

impl<T: fmt::Display> fmt::Display for Stored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => value.fmt(f),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// A checklist item describing expected application behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: i64,
    pub priority: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    pub passes: bool,
    pub in_progress: bool,
}

/// Fields for seeding a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeature {
    #[serde(default = "default_priority")]
    pub priority: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
    #[serde(default)]
    pub passes: bool,
    #[serde(default)]
    pub in_progress: bool,
}

fn default_priority() -> i64 {
    DEFAULT_FEATURE_PRIORITY
}

/// An issue discovered during an exploration session.
///
/// `related_feature_id` is a weak reference: it is stored as given and is not
/// required to resolve to an existing feature. Orphaned references are valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub id: i64,
    pub severity: Stored<Severity>,
    pub category: Stored<Category>,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: Vec<String>,
    pub expected_behavior: Option<String>,
    pub actual_behavior: Option<String>,
    pub screenshot_path: Option<String>,
    pub url: Option<String>,
    pub related_feature_id: Option<i64>,
    pub status: Stored<FindingStatus>,
    pub suggested_fix: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Validated fields for reporting a finding.
#[derive(Debug, Clone)]
pub struct NewFinding {
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub steps_to_reproduce: Vec<String>,
    pub expected_behavior: Option<String>,
    pub actual_behavior: Option<String>,
    pub url: Option<String>,
    pub related_feature_id: Option<i64>,
    pub suggested_fix: Option<String>,
    pub screenshot_path: Option<String>,
}

impl NewFinding {
    pub fn new(
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
        steps_to_reproduce: Vec<String>,
    ) -> Self {
        Self {
            severity,
            category,
            title: title.into(),
            description: description.into(),
            steps_to_reproduce,
            expected_behavior: None,
            actual_behavior: None,
            url: None,
            related_feature_id: None,
            suggested_fix: None,
            screenshot_path: None,
        }
    }
}

/// Conjunctive filter for listing findings. `None` fields do not constrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindingFilter {
    pub status: Option<FindingStatus>,
    pub severity: Option<Severity>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> i64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn slot(&mut self, severity: Severity) -> &mut i64 {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub open: i64,
    pub in_progress: i64,
    pub fixed: i64,
    pub wont_fix: i64,
}

impl StatusCounts {
    pub fn get(&self, status: FindingStatus) -> i64 {
        match status {
            FindingStatus::Open => self.open,
            FindingStatus::InProgress => self.in_progress,
            FindingStatus::Fixed => self.fixed,
            FindingStatus::WontFix => self.wont_fix,
        }
    }

    pub fn slot(&mut self, status: FindingStatus) -> &mut i64 {
        match status {
            FindingStatus::Open => &mut self.open,
            FindingStatus::InProgress => &mut self.in_progress,
            FindingStatus::Fixed => &mut self.fixed,
            FindingStatus::WontFix => &mut self.wont_fix,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
    pub functional: i64,
    pub ux: i64,
    #[serde(rename = "edge-case")]
    pub edge_case: i64,
    pub security: i64,
    pub accessibility: i64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Functional => self.functional,
            Category::Ux => self.ux,
            Category::EdgeCase => self.edge_case,
            Category::Security => self.security,
            Category::Accessibility => self.accessibility,
        }
    }

    pub fn slot(&mut self, category: Category) -> &mut i64 {
        match category {
            Category::Functional => &mut self.functional,
            Category::Ux => &mut self.ux,
            Category::EdgeCase => &mut self.edge_case,
            Category::Security => &mut self.security,
            Category::Accessibility => &mut self.accessibility,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FindingStats {
    pub total: i64,
    pub by_severity: SeverityCounts,
    pub by_status: StatusCounts,
    pub by_category: CategoryCounts,
    pub open_critical: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoverageStats {
    pub total_features: i64,
    pub passing_features: i64,
    pub features_with_findings: i64,
    pub total_findings: i64,
    pub open_findings: i64,
    pub coverage_percentage: f64,
}

/// `passing / total * 100`, rounded to one decimal place; 0 when there are no features.
pub fn coverage_percentage(passing: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = passing as f64 / total as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parses_any_case_to_lowercase() {
        for input in ["CRITICAL", "Critical", "critical", " cRiTiCaL "] {
            let sev: Severity = input.parse().unwrap();
            assert_eq!(sev, Severity::Critical);
            assert_eq!(sev.as_str(), "critical");
        }
    }

    #[test]
    fn test_severity_rejects_unknown_value() {
        let err = "extreme".parse::<Severity>().unwrap_err();
        assert!(err.contains("extreme"));
        assert!(err.contains("critical, high, medium, low"));
    }

    #[test]
    fn test_severity_rank_order() {
        let ranks: Vec<u8> = Severity::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(UNRANKED_SEVERITY > Severity::Low.rank());
    }

    #[test]
    fn test_category_edge_case_uses_hyphen() {
        let cat: Category = "Edge-Case".parse().unwrap();
        assert_eq!(cat, Category::EdgeCase);
        assert_eq!(cat.as_str(), "edge-case");
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"edge-case\"");
        assert!("edge_case".parse::<Category>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_serde() {
        for status in FindingStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: FindingStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
        assert_eq!(FindingStatus::default(), FindingStatus::Open);
    }

    #[test]
    fn test_stored_keeps_unrecognized_values() {
        let legacy: Stored<Severity> = Stored::parse("urgent".to_string());
        assert_eq!(legacy, Stored::<Severity>::Unrecognized("urgent".to_string()));
        assert_eq!(legacy.rank(), UNRANKED_SEVERITY);
        assert_eq!(legacy.to_string(), "urgent");
        assert_eq!(serde_json::to_value(&legacy).unwrap(), "urgent");

        let known: Stored<Severity> = Stored::parse("high".to_string());
        assert_eq!(known, Severity::High);
        assert_eq!(known.rank(), 2);
        assert_eq!(serde_json::to_value(&known).unwrap(), "high");
    }

    #[test]
    fn test_coverage_percentage() {
        assert_eq!(coverage_percentage(0, 0), 0.0);
        assert_eq!(coverage_percentage(1, 4), 25.0);
        assert_eq!(coverage_percentage(1, 3), 33.3);
        assert_eq!(coverage_percentage(2, 3), 66.7);
        assert_eq!(coverage_percentage(5, 5), 100.0);
    }

    #[test]
    fn test_category_counts_serialize_with_hyphenated_key() {
        let mut counts = CategoryCounts::default();
        *counts.slot(Category::EdgeCase) += 2;
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["edge-case"], 2);
        assert_eq!(json["functional"], 0);
    }

    #[test]
    fn test_new_feature_defaults() {
        let feature: NewFeature = serde_json::from_str(
            r#"{"category": "auth", "name": "Login", "description": "User can log in", "steps": ["open /login"]}"#,
        )
        .unwrap();
        assert_eq!(feature.priority, DEFAULT_FEATURE_PRIORITY);
        assert!(!feature.passes);
        assert!(!feature.in_progress);
    }
}
