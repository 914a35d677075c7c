use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "scout")]
#[command(version, about = "Autonomous exploratory testing orchestrator")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log filter (e.g. "debug", "scout=trace"). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Project directory or registered project name (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run exploration sessions until testing completes, the limit is hit, or Ctrl+C
    Run {
        /// Stop after this many sessions (unbounded when omitted)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_iterations: Option<u32>,

        /// Model passed to the agent (overrides scout.toml and SCOUT_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Serve the tool surface as an MCP server on stdio
    Mcp,
    /// Serve the reporting HTTP API
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3142")]
        port: u16,

        /// Enable dev mode (bind all interfaces, permissive CORS)
        #[arg(long)]
        dev: bool,
    },
    /// Call one tool and print its JSON result
    Call {
        /// Tool name, e.g. finding_list
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// List the tools and their input schemas
    Tools,
    /// Show finding and coverage statistics
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the feature checklist
    Features {
        #[command(subcommand)]
        command: FeaturesCommands,
    },
    /// Manage the registry of named projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Show, validate or initialize .scout/scout.toml
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum FeaturesCommands {
    /// Import features from a JSON array
    Import { file: PathBuf },
    /// Set a feature's passing / in-progress flags
    Mark {
        id: i64,

        #[arg(long, conflicts_with = "failing")]
        passing: bool,

        #[arg(long)]
        failing: bool,

        #[arg(long, conflicts_with = "idle")]
        in_progress: bool,

        #[arg(long)]
        idle: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ProjectCommands {
    /// Register a project directory under a name
    Add { name: String, path: PathBuf },
    /// List registered projects
    List,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and report problems
    Validate,
    /// Write a default scout.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Registry commands run without resolving a project.
    let project = || resolve_project_dir(cli.project_dir.as_deref());

    match &cli.command {
        Commands::Run {
            max_iterations,
            model,
        } => {
            cmd::run_loop(&cli, project()?, *max_iterations, model.clone()).await?;
        }
        Commands::Mcp => cmd::cmd_mcp(&cli, &project()?).await?,
        Commands::Serve { port, dev } => cmd::cmd_serve(&cli, &project()?, *port, *dev).await?,
        Commands::Call { tool, args } => cmd::cmd_call(&cli, &project()?, tool, args).await?,
        Commands::Tools => cmd::cmd_tools()?,
        Commands::Stats { json } => cmd::cmd_stats(&cli, &project()?, *json).await?,
        Commands::Features { command } => {
            cmd::cmd_features(&cli, &project()?, command.clone()).await?
        }
        Commands::Project { command } => cmd::cmd_project(command.clone())?,
        Commands::Config { command } => cmd::cmd_config(&project()?, command.clone())?,
    }

    Ok(())
}

fn resolve_project_dir(identifier: Option<&str>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let Some(identifier) = identifier else {
        return Ok(cwd);
    };
    let registry = match scout::project::ProjectRegistry::default_path() {
        Some(path) => scout::project::ProjectRegistry::load_or_default(&path)?,
        None => scout::project::ProjectRegistry::default(),
    };
    Ok(scout::project::resolve_project(identifier, &registry, &cwd)?)
}
