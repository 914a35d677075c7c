use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::models::{
    CoverageStats, Feature, Finding, FindingFilter, FindingStats, FindingStatus, NewFeature,
    NewFinding, coverage_percentage,
};
use super::{FEATURES_DB_FILE, FINDINGS_DB_FILE, FeatureDb, FindingDb, MAX_LIST_LIMIT};
use crate::errors::StoreError;

/// Thread-safe handle to one SQLite database, serializing access through a
/// mutex and running every call on the blocking pool.
pub struct DbHandle<T> {
    inner: Arc<std::sync::Mutex<T>>,
}

impl<T> Clone for DbHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> DbHandle<T> {
    pub fn new(db: T) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&T) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Database(anyhow::anyhow!("DB task panicked: {}", e)))?
    }
}

/// The tracking store: feature checklist plus findings, each in its own database.
///
/// Cloning is cheap and every clone shares the same connections.
#[derive(Clone)]
pub struct TrackingStore {
    features: DbHandle<FeatureDb>,
    findings: DbHandle<FindingDb>,
}

impl TrackingStore {
    /// Open both databases inside `project_dir`, creating and migrating them as needed.
    pub fn open(project_dir: &Path) -> Result<Self, StoreError> {
        let features_path = project_dir.join(FEATURES_DB_FILE);
        let features = FeatureDb::new(&features_path).map_err(|source| StoreError::Unavailable {
            path: features_path.clone(),
            source,
        })?;

        let findings_path = project_dir.join(FINDINGS_DB_FILE);
        let findings = FindingDb::new(&findings_path).map_err(|source| StoreError::Unavailable {
            path: findings_path.clone(),
            source,
        })?;

        info!(project_dir = %project_dir.display(), "Opened tracking store");
        Ok(Self::from_parts(features, findings))
    }

    /// Both databases in memory (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_parts(
            FeatureDb::new_in_memory()?,
            FindingDb::new_in_memory()?,
        ))
    }

    pub fn from_parts(features: FeatureDb, findings: FindingDb) -> Self {
        Self {
            features: DbHandle::new(features),
            findings: DbHandle::new(findings),
        }
    }

    /// Persist a new finding with status `open` and no `updated_at`.
    pub async fn create_finding(&self, finding: NewFinding) -> Result<Finding, StoreError> {
        validate_new_finding(&finding)?;
        let created = self
            .findings
            .call(move |db| Ok(db.create_finding(&finding)?))
            .await?;
        info!(id = created.id, severity = %created.severity, title = %created.title, "Finding reported");
        Ok(created)
    }

    pub async fn update_finding_status(
        &self,
        id: i64,
        status: FindingStatus,
    ) -> Result<Finding, StoreError> {
        validate_id("finding_id", id)?;
        let updated = self
            .findings
            .call(move |db| {
                db.update_status(id, status)?
                    .ok_or(StoreError::NotFound { entity: "Finding", id })
            })
            .await?;
        info!(id, status = %status, "Finding status updated");
        Ok(updated)
    }

    /// Matching findings ordered most severe first, then oldest first.
    /// `limit` must be within `1..=100`.
    pub async fn list_findings(
        &self,
        filter: FindingFilter,
        limit: i64,
    ) -> Result<Vec<Finding>, StoreError> {
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(StoreError::validation(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIST_LIMIT, limit
            )));
        }
        debug!(?filter, limit, "TrackingStore::list_findings");
        self.findings
            .call(move |db| Ok(db.list_findings(&filter, limit)?))
            .await
    }

    pub async fn finding_stats(&self) -> Result<FindingStats, StoreError> {
        self.findings.call(|db| Ok(db.stats()?)).await
    }

    pub async fn create_feature(&self, feature: NewFeature) -> Result<Feature, StoreError> {
        validate_new_feature(&feature)?;
        self.features
            .call(move |db| Ok(db.create_feature(&feature)?))
            .await
    }

    /// Seed a batch of features. Every entry is validated before anything is
    /// written, and the inserts share one transaction.
    pub async fn import_features(
        &self,
        features: Vec<NewFeature>,
    ) -> Result<Vec<Feature>, StoreError> {
        for (index, feature) in features.iter().enumerate() {
            validate_new_feature(feature).map_err(|e| {
                StoreError::validation(format!("Feature #{} ('{}'): {}", index + 1, feature.name, e))
            })?;
        }
        let imported = self
            .features
            .call(move |db| Ok(db.create_features(&features)?))
            .await?;
        info!(count = imported.len(), "Imported features");
        Ok(imported)
    }

    pub async fn get_feature(&self, id: i64) -> Result<Feature, StoreError> {
        validate_id("feature_id", id)?;
        self.features
            .call(move |db| {
                db.get_feature(id)?
                    .ok_or(StoreError::NotFound { entity: "Feature", id })
            })
            .await
    }

    pub async fn list_features(&self, include_passing: bool) -> Result<Vec<Feature>, StoreError> {
        self.features
            .call(move |db| Ok(db.list_features(include_passing)?))
            .await
    }

    /// Update a feature's pass / in-progress flags. `None` leaves a flag untouched.
    pub async fn mark_feature(
        &self,
        id: i64,
        passes: Option<bool>,
        in_progress: Option<bool>,
    ) -> Result<Feature, StoreError> {
        validate_id("feature_id", id)?;
        if passes.is_none() && in_progress.is_none() {
            return Err(StoreError::validation(
                "Nothing to update: set passes and/or in_progress",
            ));
        }
        self.features
            .call(move |db| {
                db.mark_feature(id, passes, in_progress)?
                    .ok_or(StoreError::NotFound { entity: "Feature", id })
            })
            .await
    }

    /// Coverage summary across both databases. The two halves are read
    /// separately; no cross-database snapshot is taken.
    pub async fn coverage_stats(&self) -> Result<CoverageStats, StoreError> {
        let (total_features, passing_features) = self
            .features
            .call(|db| Ok((db.count_features()?, db.count_passing()?)))
            .await?;
        let (features_with_findings, total_findings, open_findings) = self
            .findings
            .call(|db| {
                Ok((
                    db.count_related_features()?,
                    db.count_findings()?,
                    db.count_open()?,
                ))
            })
            .await?;

        Ok(CoverageStats {
            total_features,
            passing_features,
            features_with_findings,
            total_findings,
            open_findings,
            coverage_percentage: coverage_percentage(passing_features, total_features),
        })
    }
}

fn validate_id(field: &str, id: i64) -> Result<(), StoreError> {
    if id < 1 {
        return Err(StoreError::validation(format!(
            "{} must be a positive integer, got {}",
            field, id
        )));
    }
    Ok(())
}

fn validate_new_feature(feature: &NewFeature) -> Result<(), StoreError> {
    if feature.name.trim().is_empty() {
        return Err(StoreError::validation("Feature name must not be empty"));
    }
    if feature.steps.is_empty() {
        return Err(StoreError::validation("Feature steps must not be empty"));
    }
    Ok(())
}

fn validate_new_finding(finding: &NewFinding) -> Result<(), StoreError> {
    if finding.title.trim().is_empty() {
        return Err(StoreError::validation("title must not be empty"));
    }
    if finding.description.trim().is_empty() {
        return Err(StoreError::validation("description must not be empty"));
    }
    if finding.steps_to_reproduce.is_empty() {
        return Err(StoreError::validation(
            "steps_to_reproduce must contain at least one step",
        ));
    }
    if let Some(related) = finding.related_feature_id {
        validate_id("related_feature_id", related)?;
    }
    Ok(())
}
