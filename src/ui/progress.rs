use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::session::SessionSignal;
use crate::ui::icons::{CHECK, CLOCK, CROSS, SEARCH};

/// Terminal UI for the exploration loop: one spinner for the in-flight
/// session, with tool activity printed above it.
pub struct SessionUI {
    multi: MultiProgress,
    session_bar: ProgressBar,
    verbose: bool,
    current_iter: AtomicU32,
    /// 0 when the loop is unbounded.
    max_iter: AtomicU32,
}

impl SessionUI {
    pub fn new(verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let session_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let session_bar = multi.add(ProgressBar::new_spinner());
        session_bar.set_style(session_style);
        session_bar.set_prefix("Session");

        Self {
            multi,
            session_bar,
            verbose,
            current_iter: AtomicU32::new(0),
            max_iter: AtomicU32::new(0),
        }
    }

    /// Print a line above the spinner, falling back to stderr when the
    /// spinner is hidden (non-terminal output).
    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.is_hidden() || self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    fn counter(&self) -> String {
        let iter = self.current_iter.load(Ordering::SeqCst);
        match self.max_iter.load(Ordering::SeqCst) {
            0 => format!("{}", style(iter).cyan()),
            max => format!("{}/{}", style(iter).cyan(), max),
        }
    }

    /// Record the session number and start the spinner.
    pub fn start_session(&self, iter: u32, max: Option<u32>) {
        self.current_iter.store(iter, Ordering::SeqCst);
        self.max_iter.store(max.unwrap_or(0), Ordering::SeqCst);
        self.session_bar.reset();
        self.session_bar.set_message(format!(
            "{}Running session {} {}",
            SEARCH,
            self.counter(),
            style("(starting...)").dim()
        ));
        self.session_bar
            .enable_steady_tick(Duration::from_millis(100));
    }

    /// Short status for the spinner; printed as a line in verbose mode.
    pub fn log_step(&self, msg: &str) {
        self.session_bar.set_message(format!(
            "Running session {} {}",
            self.counter(),
            style(format!("({})", msg)).dim()
        ));
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(msg).dim()));
        }
    }

    pub fn update_elapsed(&self, elapsed: Duration) {
        self.session_bar.set_message(format!(
            "Running session {} {}",
            self.counter(),
            style(format!("({})", format_elapsed(elapsed))).dim()
        ));
    }

    /// Show an agent tool call. Always printed.
    pub fn show_tool_use(&self, emoji: &str, description: &str) {
        self.session_bar.set_message(format!(
            "Running session {} {} {}",
            self.counter(),
            emoji,
            style(description).yellow()
        ));
        self.print_line(format!("    {} {}", emoji, style(description).yellow()));
    }

    /// Show a snippet of agent reasoning. Printed only in verbose mode.
    pub fn show_thinking(&self, snippet: &str) {
        self.session_bar.set_message(format!(
            "Running session {} {}",
            self.counter(),
            style(format!("💭 {}", snippet)).dim()
        ));
        if self.verbose {
            self.print_line(format!("    {} {}", style("💭").dim(), style(snippet).dim()));
        }
    }

    /// Stop the spinner with the session's classification.
    pub fn session_finished(&self, iter: u32, signal: SessionSignal, elapsed: Duration) {
        let took = format_elapsed(elapsed);
        let message = match signal {
            SessionSignal::Complete => {
                format!("{}Session {} complete - testing finished ({})", CHECK, iter, took)
            }
            SessionSignal::Continue => {
                format!("Session {} done - more to explore ({})", iter, took)
            }
            SessionSignal::Error => format!("{}Session {} failed ({})", CROSS, iter, took),
        };
        self.session_bar.finish_with_message(message.clone());
        if self.multi.is_hidden() {
            eprintln!("{}", message);
        }
    }

    pub fn backoff(&self, delay: Duration, after_error: bool) {
        let what = if after_error {
            style("Retrying with a fresh session").yellow()
        } else {
            style("Next session").dim()
        };
        self.print_line(format!("{}{} in {}", CLOCK, what, format_elapsed(delay)));
    }
}

/// `Xs`, or `Xm Ys` from one minute up.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs == 0 && elapsed.as_millis() > 0 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{}s", secs)
    }
}
