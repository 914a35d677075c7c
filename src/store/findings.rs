use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params, params_from_iter, types::Value as SqlValue};
use tracing::debug;

use super::migrations::{self, FINDING_MIGRATIONS};
use super::models::{
    Category, Finding, FindingFilter, FindingStats, FindingStatus, NewFinding, Severity, Stored,
};

const FINDING_COLUMNS: &str = "id, severity, category, title, description, steps_to_reproduce, \
     expected_behavior, actual_behavior, screenshot_path, url, related_feature_id, status, \
     suggested_fix, created_at, updated_at";

/// Most severe first; values outside the known set sort after `low`.
const SEVERITY_ORDER: &str = "CASE severity \
     WHEN 'critical' THEN 1 WHEN 'high' THEN 2 WHEN 'medium' THEN 3 WHEN 'low' THEN 4 \
     ELSE 5 END";

pub struct FindingDb {
    conn: Connection,
}

impl FindingDb {
    /// Open (or create) the finding database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let db = Self {
            conn: super::open_connection(path)?,
        };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory finding database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let db = Self {
            conn: super::open_in_memory_connection()?,
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        migrations::apply(&self.conn, FINDING_MIGRATIONS).context("Failed to run finding migrations")?;
        Ok(())
    }

    pub fn create_finding(&self, finding: &NewFinding) -> Result<Finding> {
        let steps = serde_json::to_string(&finding.steps_to_reproduce)
            .context("Failed to encode steps_to_reproduce")?;
        let now = super::now_timestamp();

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        tx.execute(
            "INSERT INTO test_findings (
                severity, category, title, description, steps_to_reproduce,
                expected_behavior, actual_behavior, screenshot_path, url,
                related_feature_id, status, suggested_fix, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL)",
            params![
                finding.severity.as_str(),
                finding.category.as_str(),
                finding.title,
                finding.description,
                steps,
                finding.expected_behavior,
                finding.actual_behavior,
                finding.screenshot_path,
                finding.url,
                finding.related_feature_id,
                FindingStatus::Open.as_str(),
                finding.suggested_fix,
                now,
            ],
        )
        .context("Failed to insert finding")?;
        let id = tx.last_insert_rowid();
        let created = self
            .get_finding(id)?
            .context("Finding not found after insert")?;
        tx.commit().context("Failed to commit finding insert")?;

        debug!(id, severity = %created.severity, "FindingDb::create_finding: inserted");
        Ok(created)
    }

    pub fn get_finding(&self, id: i64) -> Result<Option<Finding>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM test_findings WHERE id = ?1", FINDING_COLUMNS))
            .context("Failed to prepare get_finding")?;
        let mut rows = stmt
            .query_map(params![id], FindingRow::from_row)
            .context("Failed to query finding")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read finding row")?;
                Ok(Some(r.into_finding()?))
            }
            None => Ok(None),
        }
    }

    /// Set the status and stamp `updated_at`. Returns `None` when no finding has the id.
    pub fn update_status(&self, id: i64, status: FindingStatus) -> Result<Option<Finding>> {
        let now = super::now_timestamp();
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let changed = tx
            .execute(
                "UPDATE test_findings SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id],
            )
            .context("Failed to update finding status")?;
        if changed == 0 {
            return Ok(None);
        }
        let updated = self.get_finding(id)?;
        tx.commit().context("Failed to commit finding status update")?;

        debug!(id, status = %status, "FindingDb::update_status: updated");
        Ok(updated)
    }

    /// Findings matching every set filter field, most severe first, then oldest
    /// first. Ordering is applied before `limit`.
    pub fn list_findings(&self, filter: &FindingFilter, limit: i64) -> Result<Vec<Finding>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(SqlValue::Text(status.as_str().to_string()));
        }
        if let Some(severity) = filter.severity {
            clauses.push("severity = ?");
            values.push(SqlValue::Text(severity.as_str().to_string()));
        }
        if let Some(category) = filter.category {
            clauses.push("category = ?");
            values.push(SqlValue::Text(category.as_str().to_string()));
        }
        values.push(SqlValue::Integer(limit));

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM test_findings {} ORDER BY {}, created_at ASC, id ASC LIMIT ?",
            FINDING_COLUMNS, where_clause, SEVERITY_ORDER
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_findings")?;
        let rows = stmt
            .query_map(params_from_iter(values), FindingRow::from_row)
            .context("Failed to query findings")?;
        let mut findings = Vec::new();
        for row in rows {
            let r = row.context("Failed to read finding row")?;
            findings.push(r.into_finding()?);
        }
        Ok(findings)
    }

    /// Aggregate counts. Values outside the known enum sets count toward
    /// `total` only.
    pub fn stats(&self) -> Result<FindingStats> {
        let mut stats = FindingStats {
            total: self.count_findings()?,
            ..Default::default()
        };

        for (value, count) in self.group_counts("severity")? {
            if let Ok(severity) = value.parse::<Severity>() {
                *stats.by_severity.slot(severity) += count;
            }
        }
        for (value, count) in self.group_counts("status")? {
            if let Ok(status) = value.parse::<FindingStatus>() {
                *stats.by_status.slot(status) += count;
            }
        }
        for (value, count) in self.group_counts("category")? {
            if let Ok(category) = value.parse::<Category>() {
                *stats.by_category.slot(category) += count;
            }
        }

        stats.open_critical = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM test_findings WHERE severity = 'critical' AND status = 'open'",
                [],
                |row| row.get(0),
            )
            .context("Failed to count open critical findings")?;

        Ok(stats)
    }

    fn group_counts(&self, column: &'static str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {col}, COUNT(*) FROM test_findings GROUP BY {col}",
                col = column
            ))
            .with_context(|| format!("Failed to prepare {} counts", column))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .with_context(|| format!("Failed to query {} counts", column))?;
        let mut counts = Vec::new();
        for row in rows {
            counts.push(row.with_context(|| format!("Failed to read {} count", column))?);
        }
        Ok(counts)
    }

    pub fn count_findings(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM test_findings", [], |row| row.get(0))
            .context("Failed to count findings")
    }

    pub fn count_open(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM test_findings WHERE status = 'open'",
                [],
                |row| row.get(0),
            )
            .context("Failed to count open findings")
    }

    /// Number of distinct features referenced by at least one finding.
    pub fn count_related_features(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(DISTINCT related_feature_id) FROM test_findings
                 WHERE related_feature_id IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .context("Failed to count features with findings")
    }
}

/// Intermediate row struct for findings.
struct FindingRow {
    id: i64,
    severity: String,
    category: String,
    title: String,
    description: String,
    steps_to_reproduce: String,
    expected_behavior: Option<String>,
    actual_behavior: Option<String>,
    screenshot_path: Option<String>,
    url: Option<String>,
    related_feature_id: Option<i64>,
    status: String,
    suggested_fix: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

impl FindingRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            severity: row.get(1)?,
            category: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            steps_to_reproduce: row.get(5)?,
            expected_behavior: row.get(6)?,
            actual_behavior: row.get(7)?,
            screenshot_path: row.get(8)?,
            url: row.get(9)?,
            related_feature_id: row.get(10)?,
            status: row.get(11)?,
            suggested_fix: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    fn into_finding(self) -> Result<Finding> {
        // Writes are validated; reads tolerate values other tools stored.
        let severity = Stored::parse(self.severity);
        let category = Stored::parse(self.category);
        let status = Stored::parse(self.status);
        let steps_to_reproduce: Vec<String> = serde_json::from_str(&self.steps_to_reproduce)
            .context("Failed to parse steps_to_reproduce JSON")?;
        let created_at = super::parse_timestamp(&self.created_at)?;
        let updated_at = self
            .updated_at
            .as_deref()
            .map(super::parse_timestamp)
            .transpose()?;

        Ok(Finding {
            id: self.id,
            severity,
            category,
            title: self.title,
            description: self.description,
            steps_to_reproduce,
            expected_behavior: self.expected_behavior,
            actual_behavior: self.actual_behavior,
            screenshot_path: self.screenshot_path,
            url: self.url,
            related_feature_id: self.related_feature_id,
            status,
            suggested_fix: self.suggested_fix,
            created_at,
            updated_at,
        })
    }
}
