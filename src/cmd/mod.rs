//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                  |
//! |-------------|-----------------------------------|
//! | `run`       | `Run`                             |
//! | `serve`     | `Mcp`, `Serve`                    |
//! | `tools`     | `Tools`, `Call`                   |
//! | `report`    | `Stats`                           |
//! | `features`  | `Features`                        |
//! | `project`   | `Project`                         |
//! | `config`    | `Config`                          |

pub mod config;
pub mod features;
pub mod project;
pub mod report;
pub mod run;
pub mod serve;
pub mod tools;

pub use config::cmd_config;
pub use features::cmd_features;
pub use project::cmd_project;
pub use report::cmd_stats;
pub use run::run_loop;
pub use serve::{cmd_mcp, cmd_serve};
pub use tools::{cmd_call, cmd_tools};

use std::path::Path;

use anyhow::Result;
use scout::config::{CliOverrides, Config};
use scout::logging::{LogTarget, default_level, init_logging};
use tracing_appender::non_blocking::WorkerGuard;

use super::Cli;

pub(crate) fn overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        model: None,
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
    }
}

/// Long-running commands log to `.scout/logs/scout.log`; the terminal is
/// reserved for the UI (or protocol frames).
pub(crate) fn init_file_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    config.ensure_directories()?;
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_level(config.verbose).to_string());
    init_logging(&level, LogTarget::File(config.log_dir.clone()))
}

/// One-shot commands log warnings to stderr unless asked for more.
pub(crate) fn init_stderr_logging(cli: &Cli) -> Result<()> {
    let level = match (&cli.log_level, cli.verbose) {
        (Some(level), _) => level.clone(),
        (None, true) => "debug".to_string(),
        (None, false) => "warn".to_string(),
    };
    init_logging(&level, LogTarget::Stderr)?;
    Ok(())
}

pub(crate) fn load_config(cli: &Cli, project_dir: &Path) -> Result<Config> {
    Ok(Config::new(project_dir, overrides(cli))?)
}
