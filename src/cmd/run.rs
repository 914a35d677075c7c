//! The exploration loop: `scout run`.

use anyhow::Result;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use super::super::Cli;

pub async fn run_loop(
    cli: &Cli,
    project_dir: PathBuf,
    max_iterations: Option<u32>,
    model: Option<String>,
) -> Result<()> {
    use scout::config::Config;
    use scout::errors::OrchestratorError;
    use scout::orchestrator::{LoopConfig, Orchestrator, SessionLog, StopReason};
    use scout::session::ClaudeSessionRunner;
    use scout::store::TrackingStore;
    use scout::ui::{SessionUI, icons};
    use tokio::sync::watch;

    let mut overrides = super::overrides(cli);
    overrides.model = model;
    let config = Config::new(&project_dir, overrides)?;
    let _log_guard = super::init_file_logging(&config)?;

    // Both databases must open before the first session.
    let store = TrackingStore::open(&config.project_dir).map_err(|e| {
        tracing::error!(error = %e, "Tracking store unavailable");
        OrchestratorError::StorageUnavailable(e)
    })?;
    let coverage = store
        .coverage_stats()
        .await
        .map_err(OrchestratorError::StorageUnavailable)?;

    println!();
    println!("{}", style("Scout exploratory testing").bold());
    println!("  Project:    {}", config.project_dir.display());
    println!("  Model:      {}", config.model);
    println!(
        "  Sessions:   {}",
        max_iterations
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!(
        "  Checklist:  {} features, {} passing ({}%)",
        coverage.total_features, coverage.passing_features, coverage.coverage_percentage
    );
    println!(
        "  Findings:   {} total, {} open",
        coverage.total_findings, coverage.open_findings
    );
    println!("  Logs:       {}", config.log_dir.display());
    println!();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\n{}{}",
                icons::STOP,
                style("Stop requested. Finishing the current session...").yellow()
            );
            let _ = cancel_tx.send(true);
        }
    });

    let ui = Arc::new(SessionUI::new(cli.verbose));
    let runner = ClaudeSessionRunner::new(config.clone()).with_ui(ui.clone());
    let mut orchestrator = Orchestrator::new(
        runner,
        LoopConfig::from_config(&config, max_iterations),
        cancel_rx,
    )
    .with_ui(ui)
    .with_session_log(SessionLog::new(config.log_dir.join(SessionLog::FILE_NAME)));

    let summary = orchestrator.run().await;
    let stats = store.finding_stats().await.ok();

    println!();
    match summary.reason {
        StopReason::WorkFinished => println!(
            "{}{}",
            icons::CHECK,
            style("Testing complete: the agent found nothing left to explore").green().bold()
        ),
        StopReason::LimitReached => println!(
            "{}{}",
            icons::STOP,
            style(format!(
                "Reached max iterations ({})",
                max_iterations.unwrap_or_default()
            ))
            .yellow()
        ),
        StopReason::UserInterrupt => {
            println!("{}{}", icons::STOP, style("Stopped by user").yellow())
        }
    }
    println!(
        "  Sessions run: {} ({} failed)",
        summary.sessions, summary.errors
    );
    if let Some(stats) = stats {
        println!(
            "  {}Findings: {} total, {} open critical",
            icons::BUG,
            stats.total,
            stats.open_critical
        );
    }
    if summary.reason != StopReason::WorkFinished {
        println!();
        println!("To resume, run the same command again");
    }

    Ok(())
}
