//! Registry of named projects and resolution of project identifiers.
//!
//! The registry lives at `<config dir>/scout/projects.toml`; set
//! `SCOUT_CONFIG_DIR` to relocate it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;

pub const REGISTRY_FILE_NAME: &str = "projects.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProjectRegistry {
    #[serde(default)]
    pub projects: BTreeMap<String, PathBuf>,
}

impl ProjectRegistry {
    /// Default registry location.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("SCOUT_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join(REGISTRY_FILE_NAME));
        }
        dirs::config_dir().map(|dir| dir.join("scout").join(REGISTRY_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project registry: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse project registry: {}", path.display()))
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create registry directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize project registry")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write project registry: {}", path.display()))?;
        Ok(())
    }

    /// Register (or re-point) `name`. The path must exist and is stored absolute.
    pub fn register(&mut self, name: &str, path: &Path) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Project name must not be empty");
        }
        if name.contains(['/', '\\']) {
            bail!("Project name '{}' must not contain path separators", name);
        }
        let absolute = path
            .canonicalize()
            .with_context(|| format!("Project path does not exist: {}", path.display()))?;
        if !absolute.is_dir() {
            bail!("Project path is not a directory: {}", absolute.display());
        }
        self.projects.insert(name.to_string(), absolute.clone());
        Ok(absolute)
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.projects.get(name).map(PathBuf::as_path)
    }
}

/// Resolve a project identifier to a directory.
///
/// An absolute path must exist. Otherwise a registered name wins over a
/// relative path (resolved against `cwd`), which must exist.
pub fn resolve_project(
    identifier: &str,
    registry: &ProjectRegistry,
    cwd: &Path,
) -> Result<PathBuf, OrchestratorError> {
    let as_path = Path::new(identifier);
    if as_path.is_absolute() {
        if as_path.is_dir() {
            return Ok(as_path.to_path_buf());
        }
        return Err(OrchestratorError::Config(format!(
            "Project directory does not exist: {}",
            as_path.display()
        )));
    }

    if let Some(path) = registry.get(identifier) {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(OrchestratorError::Config(format!(
            "Registered project '{}' points to a missing directory: {}",
            identifier,
            path.display()
        )));
    }

    let relative = cwd.join(as_path);
    if relative.is_dir() {
        return Ok(relative);
    }

    Err(OrchestratorError::Config(format!(
        "Unknown project '{}': not a registered name or an existing directory",
        identifier
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_register_and_round_trip() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("shop");
        std::fs::create_dir_all(&project).unwrap();

        let mut registry = ProjectRegistry::default();
        let stored = registry.register("shop", &project).unwrap();
        assert!(stored.is_absolute());

        let path = dir.path().join("cfg").join(REGISTRY_FILE_NAME);
        registry.save(&path).unwrap();
        let loaded = ProjectRegistry::load_or_default(&path).unwrap();
        assert_eq!(loaded, registry);
        assert_eq!(loaded.get("shop"), Some(stored.as_path()));
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let dir = tempdir().unwrap();
        let mut registry = ProjectRegistry::default();
        assert!(registry.register("", dir.path()).is_err());
        assert!(registry.register("a/b", dir.path()).is_err());
        assert!(registry.register("ghost", &dir.path().join("nope")).is_err());
        assert!(registry.projects.is_empty());
    }

    #[test]
    fn test_resolve_absolute_path() {
        let dir = tempdir().unwrap();
        let registry = ProjectRegistry::default();
        let abs = dir.path().to_str().unwrap();
        assert_eq!(resolve_project(abs, &registry, Path::new("/")).unwrap(), dir.path());

        let missing = dir.path().join("missing");
        let err = resolve_project(missing.to_str().unwrap(), &registry, Path::new("/")).unwrap_err();
        assert!(matches!(err, OrchestratorError::Config(_)));
    }

    #[test]
    fn test_registered_name_wins_over_relative_path() {
        let dir = tempdir().unwrap();
        let registered = dir.path().join("elsewhere");
        let local = dir.path().join("app");
        std::fs::create_dir_all(&registered).unwrap();
        std::fs::create_dir_all(&local).unwrap();

        let mut registry = ProjectRegistry::default();
        let stored = registry.register("app", &registered).unwrap();
        assert_eq!(resolve_project("app", &registry, dir.path()).unwrap(), stored);
    }

    #[test]
    fn test_resolve_relative_and_unknown() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("local")).unwrap();
        let registry = ProjectRegistry::default();

        assert_eq!(
            resolve_project("local", &registry, dir.path()).unwrap(),
            dir.path().join("local")
        );
        let err = resolve_project("nowhere", &registry, dir.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown project 'nowhere'"));
    }
}
