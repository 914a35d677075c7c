use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::errors::OrchestratorError;
use crate::scout_config::ScoutToml;

pub const SCOUT_DIR_NAME: &str = ".scout";

/// Values supplied on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
}

/// Runtime configuration for scout.
///
/// Resolves the layered settings (defaults, `.scout/scout.toml`, environment,
/// CLI) into the concrete values the session runner and loop need.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub scout_dir: PathBuf,
    pub log_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub mcp_config_file: PathBuf,
    pub claude_cmd: String,
    pub model: String,
    pub skip_permissions: bool,
    pub continue_delay: Duration,
    pub completion_marker: String,
    pub log_level: Option<String>,
    pub verbose: bool,
}

impl Config {
    /// Load configuration for `project_dir` from file and process environment.
    pub fn new(project_dir: &Path, overrides: CliOverrides) -> Result<Self, OrchestratorError> {
        let project_dir = project_dir.canonicalize().map_err(|e| {
            OrchestratorError::Config(format!(
                "Failed to resolve project directory {}: {}",
                project_dir.display(),
                e
            ))
        })?;
        let scout_dir = project_dir.join(SCOUT_DIR_NAME);
        let mut file = ScoutToml::load_or_default(&scout_dir)
            .map_err(|e| OrchestratorError::Config(format!("{:#}", e)))?;
        file.apply_env(|key| std::env::var(key).ok());
        Self::from_parts(project_dir, file, overrides)
    }

    /// Build from an already-loaded file layer (environment applied or not).
    pub fn from_parts(
        project_dir: PathBuf,
        file: ScoutToml,
        overrides: CliOverrides,
    ) -> Result<Self, OrchestratorError> {
        let problems = file.validate();
        if !problems.is_empty() {
            return Err(OrchestratorError::Config(problems.join("; ")));
        }

        let scout_dir = project_dir.join(SCOUT_DIR_NAME);
        let model = overrides.model.unwrap_or_else(|| file.model());
        if model.trim().is_empty() {
            return Err(OrchestratorError::Config("model must not be empty".to_string()));
        }

        Ok(Self {
            log_dir: scout_dir.join("logs"),
            prompts_dir: scout_dir.join("prompts"),
            mcp_config_file: scout_dir.join("mcp.json"),
            claude_cmd: file.claude_cmd(),
            model,
            skip_permissions: file.session.skip_permissions,
            continue_delay: Duration::from_secs(file.session.continue_delay_secs),
            completion_marker: file.session.completion_marker.clone(),
            log_level: overrides.log_level.or(file.logging.level),
            verbose: overrides.verbose,
            project_dir,
            scout_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        Ok(())
    }

    /// Arguments passed to the agent CLI for one session.
    pub fn claude_flags(&self, model: &str) -> Vec<String> {
        let mut flags = Vec::new();
        if self.skip_permissions {
            flags.push("--dangerously-skip-permissions".to_string());
        }
        flags.push("--print".to_string());
        flags.push("--output-format".to_string());
        flags.push("stream-json".to_string());
        flags.push("--verbose".to_string());
        flags.push("--model".to_string());
        flags.push(model.to_string());
        flags.push("--mcp-config".to_string());
        flags.push(self.mcp_config_file.display().to_string());
        flags
    }

    pub fn session_output_file(&self, iteration: u32) -> PathBuf {
        self.log_dir
            .join(format!("session-{}-output.log", iteration))
    }

    /// Tag the agent prints once exploration is finished.
    pub fn promise_tag(&self) -> String {
        format!("<promise>{}</promise>", self.completion_marker)
    }
}
