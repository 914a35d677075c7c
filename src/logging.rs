//! Tracing subscriber setup.
//!
//! Logs never go to stdout: the `mcp` command uses stdout for protocol frames
//! and the other commands use it for their reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "scout.log";

/// Where log records are written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Append to `<dir>/scout.log` through a background writer.
    File(PathBuf),
}

/// `RUST_LOG` when set, otherwise `level` (e.g. `info`, `scout=debug`).
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{}'", level))
}

/// Install the global subscriber. Keep the returned guard alive for the life
/// of the process so buffered file records are flushed on exit.
pub fn init_logging(level: &str, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(level)?;

    match target {
        LogTarget::Stderr => {
            // A second init (tests, embedding) keeps the first subscriber.
            let _ = tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_env_filter(filter)
                .try_init();
            Ok(None)
        }
        LogTarget::File(dir) => {
            let (writer, guard) = file_writer(&dir)?;
            let _ = tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .with_env_filter(filter)
                .try_init();
            tracing::info!(log_dir = %dir.display(), "Logging initialized");
            Ok(Some(guard))
        }
    }
}

fn file_writer(dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

/// Level used when neither CLI nor config names one.
pub fn default_level(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
