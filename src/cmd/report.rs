//! Findings and coverage report: `scout stats`.

use anyhow::Result;
use console::style;
use std::path::Path;

use super::super::Cli;

pub async fn cmd_stats(cli: &Cli, project_dir: &Path, json: bool) -> Result<()> {
    use scout::orchestrator::SessionLog;
    use scout::store::{Category, FindingStatus, Severity, TrackingStore};
    use scout::ui::icons;

    super::init_stderr_logging(cli)?;
    let config = super::load_config(cli, project_dir)?;
    let store = TrackingStore::open(&config.project_dir)?;
    let findings = store.finding_stats().await?;
    let coverage = store.coverage_stats().await?;
    let last_session = SessionLog::new(config.log_dir.join(SessionLog::FILE_NAME)).last_entry();

    if json {
        let report = serde_json::json!({
            "findings": findings,
            "coverage": coverage,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}{}", icons::CHART, style("Scout report").bold());
    println!("  Project: {}", config.project_dir.display());
    println!();

    println!("{}", style("Coverage").bold());
    println!(
        "  Features passing:      {}/{} ({}%)",
        coverage.passing_features, coverage.total_features, coverage.coverage_percentage
    );
    println!("  Features with issues:  {}", coverage.features_with_findings);
    println!();

    println!(
        "{} ({} total, {} open)",
        style("Findings").bold(),
        coverage.total_findings,
        coverage.open_findings
    );
    for sev in Severity::ALL {
        let count = findings.by_severity.get(sev);
        let label = format!("{:<10}", sev.as_str());
        let label = match sev {
            Severity::Critical => style(label).red().bold(),
            Severity::High => style(label).red(),
            Severity::Medium => style(label).yellow(),
            Severity::Low => style(label).dim(),
        };
        println!("  {} {}", label, count);
    }
    println!();
    for status in FindingStatus::ALL {
        println!("  {:<12} {}", status.as_str(), findings.by_status.get(status));
    }
    println!();
    for cat in Category::ALL {
        println!("  {:<14} {}", cat.as_str(), findings.by_category.get(cat));
    }

    if findings.open_critical > 0 {
        println!();
        println!(
            "  {}{}",
            icons::BUG,
            style(format!("{} open critical finding(s)", findings.open_critical))
                .red()
                .bold()
        );
    }

    if let Some(entry) = last_session {
        println!();
        println!(
            "  Last session: #{} ({}) at {}",
            entry.iteration,
            entry.signal,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!();
    Ok(())
}
