//! Durable tracking store for features and findings.
//!
//! Two independent SQLite databases live in each project directory:
//! `features.db` holds the feature checklist and `test_findings.db` holds
//! the issues discovered by exploration sessions. [`TrackingStore`] is the
//! single writer for both; every other component goes through it.

pub mod features;
pub mod findings;
pub mod handle;
pub mod migrations;
pub mod models;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;

pub use features::FeatureDb;
pub use findings::FindingDb;
pub use handle::{DbHandle, TrackingStore};
pub use models::*;

pub const FEATURES_DB_FILE: &str = "features.db";
pub const FINDINGS_DB_FILE: &str = "test_findings.db";

/// Maximum number of findings a single list call may return.
pub const MAX_LIST_LIMIT: i64 = 100;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: i64 = 20;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a file-backed connection configured for one writer and concurrent readers.
fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("Failed to set busy timeout")?;
    // journal_mode returns the resulting mode as a row.
    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .context("Failed to enable WAL journal")?;
    Ok(conn)
}

fn open_in_memory_connection() -> Result<Connection> {
    Connection::open_in_memory().context("Failed to open in-memory SQLite database")
}

/// Current UTC time in the stored text format.
fn now_timestamp() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .with_context(|| format!("Invalid timestamp '{}'", raw))
}
