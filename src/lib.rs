pub mod config;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod project;
pub mod scout_config;
pub mod server;
pub mod session;
pub mod store;
pub mod tools;
pub mod ui;
