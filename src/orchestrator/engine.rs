use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::{LoopState, LoopSummary, SessionLog, StopReason};
use crate::config::Config;
use crate::session::{SessionRequest, SessionRunner, SessionSignal};
use crate::ui::SessionUI;

/// Loop parameters. `max_iterations: None` runs until a session completes
/// or the operator interrupts.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_iterations: Option<u32>,
    pub continue_delay: Duration,
    pub project_dir: PathBuf,
    pub model: String,
}

impl LoopConfig {
    pub fn from_config(config: &Config, max_iterations: Option<u32>) -> Self {
        Self {
            max_iterations,
            continue_delay: config.continue_delay,
            project_dir: config.project_dir.clone(),
            model: config.model.clone(),
        }
    }
}

/// Drives successive exploration sessions: RUNNING -> BACKOFF -> RUNNING ...
/// until STOPPED.
///
/// Sessions run strictly one at a time. Cancellation is checked between
/// sessions and during the backoff delay, never inside a session.
pub struct Orchestrator<R: SessionRunner> {
    runner: R,
    config: LoopConfig,
    cancel: watch::Receiver<bool>,
    ui: Option<Arc<SessionUI>>,
    session_log: Option<SessionLog>,
    state: LoopState,
    iteration: u32,
}

impl<R: SessionRunner> Orchestrator<R> {
    pub fn new(runner: R, config: LoopConfig, cancel: watch::Receiver<bool>) -> Self {
        Self {
            runner,
            config,
            cancel,
            ui: None,
            session_log: None,
            state: LoopState::Running,
            iteration: 0,
        }
    }

    pub fn with_ui(mut self, ui: Arc<SessionUI>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn with_session_log(mut self, log: SessionLog) -> Self {
        self.session_log = Some(log);
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn cancel_requested(&self) -> bool {
        *self.cancel.borrow()
    }

    fn stop(&mut self, reason: StopReason) {
        info!(reason = %reason, iteration = self.iteration, "Exploration loop stopping");
        self.state = LoopState::Stopped(reason);
    }

    /// Run until stopped. Never fails: session problems become backoffs.
    pub async fn run(&mut self) -> LoopSummary {
        let mut sessions = 0;
        let mut backoffs = 0;
        let mut errors = 0;
        let mut last_signal = SessionSignal::Continue;

        info!(
            max_iterations = ?self.config.max_iterations,
            project_dir = %self.config.project_dir.display(),
            "Exploration loop starting"
        );

        loop {
            match self.state {
                LoopState::Running => {
                    if self.cancel_requested() {
                        self.stop(StopReason::UserInterrupt);
                        continue;
                    }

                    self.iteration += 1;
                    if let Some(max) = self.config.max_iterations
                        && self.iteration > max
                    {
                        self.stop(StopReason::LimitReached);
                        continue;
                    }

                    let signal = self.run_one().await;
                    sessions += 1;
                    last_signal = signal;

                    match signal {
                        SessionSignal::Complete => self.stop(StopReason::WorkFinished),
                        SessionSignal::Continue => {
                            self.state = LoopState::Backoff(self.config.continue_delay);
                        }
                        SessionSignal::Error => {
                            errors += 1;
                            warn!(
                                iteration = self.iteration,
                                "Session ended with an error, starting a fresh one"
                            );
                            self.state = LoopState::Backoff(self.config.continue_delay);
                        }
                    }
                }
                LoopState::Backoff(delay) => {
                    backoffs += 1;
                    if let Some(ref ui) = self.ui {
                        ui.backoff(delay, last_signal == SessionSignal::Error);
                    }
                    debug!(delay_ms = delay.as_millis() as u64, "Backing off before next session");
                    if self.wait_or_cancel(delay).await {
                        self.state = LoopState::Running;
                    } else {
                        self.stop(StopReason::UserInterrupt);
                    }
                }
                LoopState::Stopped(reason) => {
                    return LoopSummary {
                        sessions,
                        backoffs,
                        errors,
                        reason,
                    };
                }
            }
        }
    }

    async fn run_one(&mut self) -> SessionSignal {
        let iteration = self.iteration;
        if let Some(ref ui) = self.ui {
            ui.start_session(iteration, self.config.max_iterations);
        }
        let start = Instant::now();

        let request = SessionRequest {
            project_dir: self.config.project_dir.clone(),
            model: self.config.model.clone(),
            iteration,
        };
        let outcome = self.runner.run(&request).await;

        if let Some(ref ui) = self.ui {
            ui.session_finished(iteration, outcome.signal, start.elapsed());
        }
        if let Some(ref log) = self.session_log
            && let Err(e) = log.save(iteration, outcome.signal)
        {
            warn!(error = %e, "Failed to record session in history");
        }
        outcome.signal
    }

    /// Sleep for `delay`; returns false if cancellation arrives first.
    async fn wait_or_cancel(&self, delay: Duration) -> bool {
        if self.cancel_requested() {
            return false;
        }
        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            if cancel.wait_for(|c| *c).await.is_err() {
                // Sender gone: nobody can cancel any more.
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancelled => false,
        }
    }
}
