pub mod engine;
pub mod state;

pub use engine::{LoopConfig, Orchestrator};
pub use state::{LoopState, LoopSummary, SessionEntry, SessionLog, StopReason};
