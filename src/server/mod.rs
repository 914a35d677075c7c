//! Transports that expose the tool surface: MCP over stdio for the agent,
//! HTTP for reporting clients.

pub mod http;
pub mod mcp;

pub use http::{ServerConfig, build_router, start_server};
pub use mcp::{handle_message, serve_stdio};
