//! Project configuration file (`.scout/scout.toml`).
//!
//! ```toml
//! [session]
//! claude_cmd = "claude"
//! model = "opus"
//! skip_permissions = true
//! continue_delay_secs = 3
//! completion_marker = "TESTING_COMPLETE"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional. Environment variables override the file; CLI flags
//! override both (see [`crate::config::Config`]).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "scout.toml";

pub const DEFAULT_CLAUDE_CMD: &str = "claude";
pub const DEFAULT_MODEL: &str = "opus";
pub const DEFAULT_CONTINUE_DELAY_SECS: u64 = 3;
pub const DEFAULT_COMPLETION_MARKER: &str = "TESTING_COMPLETE";

/// Settings for each exploration session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSection {
    /// Agent executable; falls back to `SCOUT_CLAUDE_CMD`, `CLAUDE_CMD`, then `claude`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_skip_permissions")]
    pub skip_permissions: bool,
    /// Pause between sessions, in seconds.
    #[serde(default = "default_continue_delay_secs")]
    pub continue_delay_secs: u64,
    /// Text the agent wraps in `<promise>..</promise>` when it has nothing left to test.
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
}

fn default_skip_permissions() -> bool {
    true
}

fn default_continue_delay_secs() -> u64 {
    DEFAULT_CONTINUE_DELAY_SECS
}

fn default_completion_marker() -> String {
    DEFAULT_COMPLETION_MARKER.to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            claude_cmd: None,
            model: None,
            skip_permissions: default_skip_permissions(),
            continue_delay_secs: default_continue_delay_secs(),
            completion_marker: default_completion_marker(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// Default tracing filter level when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// The complete scout.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoutToml {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ScoutToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scout.toml")
    }

    /// Load `<scout_dir>/scout.toml`, or defaults when the file does not exist.
    pub fn load_or_default(scout_dir: &Path) -> Result<Self> {
        let path = scout_dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize scout.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Overlay environment settings. `lookup` is `std::env::var(..).ok()` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cmd) = lookup("SCOUT_CLAUDE_CMD").or_else(|| lookup("CLAUDE_CMD")) {
            self.session.claude_cmd = Some(cmd);
        }
        if let Some(model) = lookup("SCOUT_MODEL") {
            self.session.model = Some(model);
        }
        if let Some(skip) = lookup("SCOUT_SKIP_PERMISSIONS") {
            self.session.skip_permissions = !matches!(
                skip.trim().to_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }
    }

    pub fn claude_cmd(&self) -> String {
        self.session
            .claude_cmd
            .clone()
            .unwrap_or_else(|| DEFAULT_CLAUDE_CMD.to_string())
    }

    pub fn model(&self) -> String {
        self.session
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// Problems that make the configuration unusable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.session.completion_marker.trim().is_empty() {
            errors.push("session.completion_marker must not be empty".to_string());
        }
        if let Some(cmd) = &self.session.claude_cmd
            && cmd.trim().is_empty()
        {
            errors.push("session.claude_cmd must not be empty".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScoutToml::parse("").unwrap();
        assert_eq!(config.session.continue_delay_secs, 3);
        assert_eq!(config.session.completion_marker, "TESTING_COMPLETE");
        assert!(config.session.skip_permissions);
        assert_eq!(config.claude_cmd(), "claude");
        assert_eq!(config.model(), "opus");
        assert!(config.logging.level.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_parse_full_file() {
        let config = ScoutToml::parse(
            r#"
            [session]
            claude_cmd = "/opt/claude"
            model = "sonnet"
            skip_permissions = false
            continue_delay_secs = 10
            completion_marker = "ALL_DONE"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.claude_cmd(), "/opt/claude");
        assert_eq!(config.model(), "sonnet");
        assert!(!config.session.skip_permissions);
        assert_eq!(config.session.continue_delay_secs, 10);
        assert_eq!(config.session.completion_marker, "ALL_DONE");
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(ScoutToml::parse("[session\ncontinue_delay_secs = ").is_err());
        assert!(ScoutToml::parse("[session]\ncontinue_delay_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = ScoutToml::parse("[session]\nclaude_cmd = \"from-file\"\nmodel = \"haiku\"").unwrap();
        config.apply_env(env(&[
            ("CLAUDE_CMD", "legacy"),
            ("SCOUT_CLAUDE_CMD", "from-env"),
            ("SCOUT_SKIP_PERMISSIONS", "false"),
        ]));
        assert_eq!(config.claude_cmd(), "from-env");
        assert_eq!(config.model(), "haiku");
        assert!(!config.session.skip_permissions);

        let mut config = ScoutToml::default();
        config.apply_env(env(&[("CLAUDE_CMD", "legacy"), ("SCOUT_MODEL", "sonnet")]));
        assert_eq!(config.claude_cmd(), "legacy");
        assert_eq!(config.model(), "sonnet");
    }

    #[test]
    fn test_validate_rejects_blank_marker() {
        let config = ScoutToml::parse("[session]\ncompletion_marker = \"  \"").unwrap();
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn test_load_or_default_and_save() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ScoutToml::load_or_default(dir.path()).unwrap(), ScoutToml::default());

        let mut config = ScoutToml::default();
        config.session.continue_delay_secs = 0;
        config.save(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        let loaded = ScoutToml::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded.session.continue_delay_secs, 0);
    }
}
