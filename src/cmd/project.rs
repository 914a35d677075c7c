//! Named project registry: `scout project`.

use anyhow::{Context, Result};

use super::super::ProjectCommands;

pub fn cmd_project(command: ProjectCommands) -> Result<()> {
    use scout::project::ProjectRegistry;

    let path = ProjectRegistry::default_path()
        .context("Could not determine the user config directory; set SCOUT_CONFIG_DIR")?;
    let mut registry = ProjectRegistry::load_or_default(&path)?;

    match command {
        ProjectCommands::Add { name, path: dir } => {
            let absolute = registry.register(&name, &dir)?;
            registry.save(&path)?;
            println!("Registered project '{}' -> {}", name.trim(), absolute.display());
        }
        ProjectCommands::List => {
            if registry.projects.is_empty() {
                println!("No projects registered. Use `scout project add <name> <path>`.");
                return Ok(());
            }
            let width = registry.projects.keys().map(|k| k.len()).max().unwrap_or(0);
            for (name, dir) in &registry.projects {
                let missing = if dir.is_dir() { "" } else { "  (missing)" };
                println!("{:<width$}  {}{}", name, dir.display(), missing, width = width);
            }
        }
    }
    Ok(())
}
