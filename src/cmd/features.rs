//! Feature checklist management: `scout features`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;

use super::super::{Cli, FeaturesCommands};

pub async fn cmd_features(cli: &Cli, project_dir: &Path, command: FeaturesCommands) -> Result<()> {
    use scout::store::{NewFeature, TrackingStore};
    use scout::ui::icons;

    super::init_stderr_logging(cli)?;
    let store = TrackingStore::open(project_dir)?;

    match command {
        FeaturesCommands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let features: Vec<NewFeature> = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a JSON array of features", file.display()))?;

            let imported = store.import_features(features).await.with_context(|| {
                format!("Nothing imported from {}", file.display())
            })?;
            for feature in &imported {
                println!("  #{:<4} {}", feature.id, feature.name);
            }
            println!(
                "{}Imported {} feature(s) from {}",
                icons::SPARKLE,
                imported.len(),
                file.display()
            );
        }
        FeaturesCommands::Mark {
            id,
            passing,
            failing,
            in_progress,
            idle,
        } => {
            let passes = flag(passing, failing);
            let in_progress = flag(in_progress, idle);
            if passes.is_none() && in_progress.is_none() {
                bail!("Nothing to update: pass --passing/--failing and/or --in-progress/--idle");
            }
            let feature = store.mark_feature(id, passes, in_progress).await?;
            let state = if feature.passes {
                style("passing").green()
            } else {
                style("not passing").yellow()
            };
            println!(
                "{}Feature #{} {} is {}{}",
                icons::CHECK,
                feature.id,
                feature.name,
                state,
                if feature.in_progress { " (in progress)" } else { "" }
            );
        }
    }
    Ok(())
}

fn flag(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}
