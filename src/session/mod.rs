//! One exploration session: spawn the agent, follow its stream, classify the end.

pub mod prompt;
pub mod runner;
pub mod signal;
pub mod stream;

pub use prompt::load_prompt;
pub use runner::{ClaudeSessionRunner, SessionRequest, SessionRunner, classify, mcp_config_json};
pub use signal::{SessionOutcome, SessionSignal};
