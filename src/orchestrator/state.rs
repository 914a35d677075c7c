use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::SessionSignal;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The iteration cap was exceeded.
    LimitReached,
    /// A session reported that nothing is left to explore.
    WorkFinished,
    /// The operator asked the loop to stop.
    UserInterrupt,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LimitReached => "limit_reached",
            Self::WorkFinished => "work_finished",
            Self::UserInterrupt => "user_interrupt",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Backoff(Duration),
    Stopped(StopReason),
}

/// Result of one loop run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopSummary {
    /// Sessions actually started.
    pub sessions: u32,
    pub backoffs: u32,
    /// Sessions that ended with the `error` signal.
    pub errors: u32,
    pub reason: StopReason,
}

/// One line of `.scout/logs/sessions.log`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub iteration: u32,
    pub signal: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only history of finished sessions: `iteration|signal|timestamp`.
///
/// Purely informational. The tracking store holds all state needed to resume.
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub const FILE_NAME: &'static str = "sessions.log";

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, iteration: u32, signal: SessionSignal) -> Result<()> {
        let entry = format!("{}|{}|{}\n", iteration, signal, Utc::now().to_rfc3339());

        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open session log")?
            .write_all(entry.as_bytes())
            .context("Failed to write session log entry")?;

        Ok(())
    }

    /// All parseable entries, oldest first. Malformed lines are skipped.
    pub fn entries(&self) -> Result<Vec<SessionEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read session log")?;

        Ok(content
            .lines()
            .filter_map(|line| {
                let mut parts = line.splitn(3, '|');
                let iteration = parts.next()?.parse().ok()?;
                let signal = parts.next()?.to_string();
                let timestamp = DateTime::parse_from_rfc3339(parts.next()?)
                    .ok()?
                    .with_timezone(&Utc);
                Some(SessionEntry {
                    iteration,
                    signal,
                    timestamp,
                })
            })
            .collect())
    }

    pub fn last_entry(&self) -> Option<SessionEntry> {
        self.entries().ok()?.pop()
    }
}
