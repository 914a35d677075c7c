//! Tool surface transports: `scout mcp` and `scout serve`.

use anyhow::Result;
use std::path::Path;

use super::super::Cli;

/// Stdio MCP server. Started by the agent through `.scout/mcp.json`.
pub async fn cmd_mcp(cli: &Cli, project_dir: &Path) -> Result<()> {
    use scout::store::TrackingStore;
    use scout::tools::ToolSurface;

    let config = super::load_config(cli, project_dir)?;
    let _log_guard = super::init_file_logging(&config)?;

    let store = TrackingStore::open(&config.project_dir)?;
    scout::server::serve_stdio(ToolSurface::standard(store)).await
}

pub async fn cmd_serve(cli: &Cli, project_dir: &Path, port: u16, dev: bool) -> Result<()> {
    use scout::server::{ServerConfig, start_server};
    use scout::store::TrackingStore;
    use scout::tools::ToolSurface;

    let config = super::load_config(cli, project_dir)?;
    let _log_guard = super::init_file_logging(&config)?;

    let store = TrackingStore::open(&config.project_dir)?;
    start_server(
        ToolSurface::standard(store),
        ServerConfig {
            port,
            dev_mode: dev,
        },
    )
    .await
}
