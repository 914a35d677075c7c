//! Tool listing and one-shot calls: `scout tools`, `scout call`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;

use super::super::Cli;

pub fn cmd_tools() -> Result<()> {
    use scout::store::TrackingStore;
    use scout::tools::ToolSurface;

    // Definitions never touch storage.
    let surface = ToolSurface::standard(TrackingStore::in_memory()?);
    for def in surface.definitions() {
        println!("{}", style(&def.name).bold());
        println!("  {}", def.description);
        if let Some(props) = def.input_schema.get("properties").and_then(|p| p.as_object()) {
            let required: Vec<&str> = def
                .input_schema
                .get("required")
                .and_then(|r| r.as_array())
                .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            for name in props.keys() {
                let marker = if required.contains(&name.as_str()) { "*" } else { " " };
                println!("    {}{}", marker, style(name).dim());
            }
        }
        println!();
    }
    Ok(())
}

pub async fn cmd_call(cli: &Cli, project_dir: &Path, tool: &str, args: &str) -> Result<()> {
    use scout::store::TrackingStore;
    use scout::tools::ToolSurface;

    super::init_stderr_logging(cli)?;
    let input: serde_json::Value =
        serde_json::from_str(args).context("--args must be a JSON object")?;

    let store = TrackingStore::open(project_dir)?;
    let surface = ToolSurface::standard(store);
    let result = surface.call(tool, input).await;
    println!("{}", result.to_text());

    if !surface.has_tool(tool) {
        bail!(
            "Unknown tool '{}'. Available tools: {}",
            tool,
            surface.tool_names().join(", ")
        );
    }
    if let Some(kind) = result.error_kind {
        bail!("Tool '{}' failed ({})", tool, kind.as_str());
    }
    Ok(())
}
