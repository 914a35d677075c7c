use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::debug;

use super::migrations::{self, FEATURE_MIGRATIONS};
use super::models::{Feature, NewFeature};

const FEATURE_COLUMNS: &str = "id, priority, category, name, description, steps, passes, in_progress";

pub struct FeatureDb {
    conn: Connection,
}

impl FeatureDb {
    /// Open (or create) the feature database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let db = Self {
            conn: super::open_connection(path)?,
        };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory feature database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let db = Self {
            conn: super::open_in_memory_connection()?,
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        migrations::apply(&self.conn, FEATURE_MIGRATIONS).context("Failed to run feature migrations")?;
        Ok(())
    }

    pub fn create_feature(&self, feature: &NewFeature) -> Result<Feature> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let id = insert_feature(&tx, feature)?;
        let created = self
            .get_feature(id)?
            .context("Feature not found after insert")?;
        tx.commit().context("Failed to commit feature insert")?;

        debug!(id, name = %created.name, "FeatureDb::create_feature: inserted");
        Ok(created)
    }

    /// Insert a batch in one transaction: either every feature lands or none do.
    pub fn create_features(&self, features: &[NewFeature]) -> Result<Vec<Feature>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let mut created = Vec::with_capacity(features.len());
        for feature in features {
            let id = insert_feature(&tx, feature)
                .with_context(|| format!("Failed to import feature '{}'", feature.name))?;
            created.push(
                self.get_feature(id)?
                    .context("Feature not found after insert")?,
            );
        }
        tx.commit().context("Failed to commit feature import")?;

        debug!(count = created.len(), "FeatureDb::create_features: inserted");
        Ok(created)
    }

    pub fn get_feature(&self, id: i64) -> Result<Option<Feature>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM features WHERE id = ?1", FEATURE_COLUMNS))
            .context("Failed to prepare get_feature")?;
        let mut rows = stmt
            .query_map(params![id], FeatureRow::from_row)
            .context("Failed to query feature")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read feature row")?;
                Ok(Some(r.into_feature()?))
            }
            None => Ok(None),
        }
    }

    /// Features ordered by priority (lowest first), optionally hiding passing ones.
    pub fn list_features(&self, include_passing: bool) -> Result<Vec<Feature>> {
        let sql = if include_passing {
            format!("SELECT {} FROM features ORDER BY priority ASC, id ASC", FEATURE_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM features WHERE COALESCE(passes, 0) = 0 ORDER BY priority ASC, id ASC",
                FEATURE_COLUMNS
            )
        };
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_features")?;
        let rows = stmt
            .query_map([], FeatureRow::from_row)
            .context("Failed to query features")?;
        let mut features = Vec::new();
        for row in rows {
            let r = row.context("Failed to read feature row")?;
            features.push(r.into_feature()?);
        }
        Ok(features)
    }

    /// Set the pass / in-progress flags. `None` leaves a flag untouched.
    /// Returns `None` when no feature has the given id.
    pub fn mark_feature(
        &self,
        id: i64,
        passes: Option<bool>,
        in_progress: Option<bool>,
    ) -> Result<Option<Feature>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let changed = tx
            .execute(
                "UPDATE features
                 SET passes = COALESCE(?1, passes), in_progress = COALESCE(?2, in_progress)
                 WHERE id = ?3",
                params![passes, in_progress, id],
            )
            .context("Failed to update feature")?;
        if changed == 0 {
            return Ok(None);
        }
        let updated = self.get_feature(id)?;
        tx.commit().context("Failed to commit feature update")?;
        Ok(updated)
    }

    pub fn count_features(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))
            .context("Failed to count features")
    }

    pub fn count_passing(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM features WHERE COALESCE(passes, 0) = 1",
                [],
                |row| row.get(0),
            )
            .context("Failed to count passing features")
    }
}

fn insert_feature(conn: &Connection, feature: &NewFeature) -> Result<i64> {
    let steps = serde_json::to_string(&feature.steps).context("Failed to encode feature steps")?;
    conn.execute(
        "INSERT INTO features (priority, category, name, description, steps, passes, in_progress)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            feature.priority,
            feature.category,
            feature.name,
            feature.description,
            steps,
            feature.passes,
            feature.in_progress
        ],
    )
    .context("Failed to insert feature")?;
    Ok(conn.last_insert_rowid())
}

/// Intermediate row struct for features.
struct FeatureRow {
    id: i64,
    priority: i64,
    category: String,
    name: String,
    description: String,
    steps: String,
    passes: Option<bool>,
    in_progress: Option<bool>,
}

impl FeatureRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            priority: row.get(1)?,
            category: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            steps: row.get(5)?,
            passes: row.get(6)?,
            in_progress: row.get(7)?,
        })
    }

    fn into_feature(self) -> Result<Feature> {
        let steps: Vec<String> =
            serde_json::from_str(&self.steps).context("Failed to parse feature steps JSON")?;
        Ok(Feature {
            id: self.id,
            priority: self.priority,
            category: self.category,
            name: self.name,
            description: self.description,
            steps,
            passes: self.passes.unwrap_or(false),
            in_progress: self.in_progress.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::DEFAULT_FEATURE_PRIORITY;

    fn feature(name: &str, priority: i64, passes: bool) -> NewFeature {
        NewFeature {
            priority,
            category: "core".to_string(),
            name: name.to_string(),
            description: format!("{} works", name),
            steps: vec!["open the app".to_string(), format!("use {}", name)],
            passes,
            in_progress: false,
        }
    }

    #[test]
    fn test_create_and_get_feature() -> Result<()> {
        let db = FeatureDb::new_in_memory()?;
        let created = db.create_feature(&feature("Login", 1, false))?;
        assert!(created.id > 0);
        assert_eq!(created.steps.len(), 2);
        assert!(!created.passes);
        assert!(!created.in_progress);

        let fetched = db.get_feature(created.id)?.expect("feature should exist");
        assert_eq!(fetched, created);
        assert!(db.get_feature(created.id + 100)?.is_none());
        Ok(())
    }

    #[test]
    fn test_list_features_ordered_by_priority() -> Result<()> {
        let db = FeatureDb::new_in_memory()?;
        db.create_feature(&feature("Search", 5, false))?;
        db.create_feature(&feature("Login", 1, true))?;
        db.create_feature(&feature("Export", DEFAULT_FEATURE_PRIORITY, false))?;
        db.create_feature(&feature("Signup", 1, false))?;

        let all = db.list_features(true)?;
        let names: Vec<&str> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Login", "Signup", "Search", "Export"]);

        let pending = db.list_features(false)?;
        let names: Vec<&str> = pending.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Signup", "Search", "Export"]);
        Ok(())
    }

    #[test]
    fn test_mark_feature_updates_only_given_flags() -> Result<()> {
        let db = FeatureDb::new_in_memory()?;
        let created = db.create_feature(&feature("Login", 1, false))?;

        let updated = db
            .mark_feature(created.id, None, Some(true))?
            .expect("feature should exist");
        assert!(updated.in_progress);
        assert!(!updated.passes);

        let updated = db
            .mark_feature(created.id, Some(true), Some(false))?
            .expect("feature should exist");
        assert!(updated.passes);
        assert!(!updated.in_progress);

        assert!(db.mark_feature(999, Some(true), None)?.is_none());
        Ok(())
    }

    #[test]
    fn test_counts_treat_null_passes_as_failing() -> Result<()> {
        let db = FeatureDb::new_in_memory()?;
        db.create_feature(&feature("Login", 1, true))?;
        db.create_feature(&feature("Signup", 2, false))?;
        db.conn.execute(
            "INSERT INTO features (priority, category, name, description, steps, passes)
             VALUES (3, 'core', 'Legacy', 'Legacy row', '[\"step\"]', NULL)",
            [],
        )?;

        assert_eq!(db.count_features()?, 3);
        assert_eq!(db.count_passing()?, 1);
        let legacy = db.list_features(false)?;
        assert_eq!(legacy.len(), 2);
        assert!(legacy.iter().all(|f| !f.passes));
        Ok(())
    }
}
