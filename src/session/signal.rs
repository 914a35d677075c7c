use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of one finished exploration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSignal {
    /// Finished normally; more work likely remains.
    Continue,
    /// Failed or ended abnormally. The next session starts fresh.
    Error,
    /// The agent reported that nothing is left to explore.
    Complete,
}

impl SessionSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Error => "error",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a session runner hands back: the signal plus the agent's output for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub signal: SessionSignal,
    pub response: String,
}

impl SessionOutcome {
    pub fn new(signal: SessionSignal, response: impl Into<String>) -> Self {
        Self {
            signal,
            response: response.into(),
        }
    }

    pub fn error(response: impl Into<String>) -> Self {
        Self::new(SessionSignal::Error, response)
    }
}
