//! Versioned schema upgrades keyed by SQLite's `user_version` pragma.
//!
//! Each store owns an ordered list of [`Migration`]s. On open, every step whose
//! version is above the stored `user_version` runs inside its own transaction,
//! then the stored version is bumped. Steps must be safe to re-run against a
//! database created before versioning existed.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

pub struct Migration {
    pub version: i32,
    pub description: &'static str,
    pub sql: &'static str,
}

pub const FEATURE_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create features table",
        sql: "
            CREATE TABLE IF NOT EXISTS features (
                id INTEGER PRIMARY KEY,
                priority INTEGER NOT NULL DEFAULT 999,
                category VARCHAR(100) NOT NULL,
                name VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                steps JSON NOT NULL,
                passes BOOLEAN DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS ix_features_id ON features(id);
            CREATE INDEX IF NOT EXISTS ix_features_priority ON features(priority);
            CREATE INDEX IF NOT EXISTS ix_features_passes ON features(passes);
        ",
    },
    Migration {
        version: 2,
        description: "add features.in_progress",
        sql: "ALTER TABLE features ADD COLUMN in_progress BOOLEAN DEFAULT 0;",
    },
    Migration {
        version: 3,
        description: "index features.in_progress",
        sql: "CREATE INDEX IF NOT EXISTS ix_features_in_progress ON features(in_progress);",
    },
];

pub const FINDING_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "create test_findings table",
    sql: "
        CREATE TABLE IF NOT EXISTS test_findings (
            id INTEGER PRIMARY KEY,
            severity VARCHAR(20) NOT NULL,
            category VARCHAR(50) NOT NULL,
            title VARCHAR(255) NOT NULL,
            description TEXT NOT NULL,
            steps_to_reproduce JSON NOT NULL,
            expected_behavior TEXT,
            actual_behavior TEXT,
            screenshot_path VARCHAR(500),
            url VARCHAR(500),
            related_feature_id INTEGER,
            status VARCHAR(20) NOT NULL DEFAULT 'open',
            suggested_fix TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME
        );
        CREATE INDEX IF NOT EXISTS ix_test_findings_id ON test_findings(id);
        CREATE INDEX IF NOT EXISTS ix_test_findings_severity ON test_findings(severity);
        CREATE INDEX IF NOT EXISTS ix_test_findings_category ON test_findings(category);
        CREATE INDEX IF NOT EXISTS ix_test_findings_related_feature_id ON test_findings(related_feature_id);
        CREATE INDEX IF NOT EXISTS ix_test_findings_status ON test_findings(status);
    ",
}];

pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to read schema version")
}

/// Bring `conn` up to the latest version in `migrations`. Returns the final version.
pub fn apply(conn: &Connection, migrations: &[Migration]) -> Result<i32> {
    let start = schema_version(conn)?;
    let mut current = start;
    debug!(current, "migrations::apply: starting");

    for migration in migrations.iter().filter(|m| m.version > start) {
        let tx = conn
            .unchecked_transaction()
            .context("Failed to begin migration transaction")?;

        match tx.execute_batch(migration.sql) {
            Ok(()) => {}
            // Databases created before versioning may already carry the column.
            Err(e) if e.to_string().contains("duplicate column") => {
                debug!(version = migration.version, "migrations::apply: column already present");
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Migration {} ({}) failed: {}",
                    migration.version,
                    migration.description,
                    e
                ));
            }
        }

        // PRAGMA does not accept bound parameters.
        tx.execute_batch(&format!("PRAGMA user_version = {}", migration.version))
            .context("Failed to record schema version")?;
        tx.commit().context("Failed to commit migration")?;

        info!(
            version = migration.version,
            description = migration.description,
            "Applied schema migration"
        );
        current = migration.version;
    }

    Ok(current)
}
