//! Typed error hierarchy for scout.
//!
//! Three top-level enums cover the three subsystems:
//! - `StoreError`: tracking store validation, lookup and storage failures
//! - `SessionError`: failures inside a single exploration session
//! - `OrchestratorError`: fatal startup conditions of the orchestration loop

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the tracking store and the tool surface in front of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Storage unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Validation and not-found errors are returned to the caller so it can
    /// adjust its next call. Everything else is a storage fault.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err)
    }
}

/// Errors from one exploration session. The session runner folds every one of
/// these into the `error` signal; they never escape the runner.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to spawn agent process `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write session file at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent process exited with non-zero code {exit_code}")]
    NonZeroExit { exit_code: i32 },

    #[error("Agent reported an error: {0}")]
    AgentReported(String),

    #[error("Session stream failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal conditions of the orchestration loop. Both abort before any session runs.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}
