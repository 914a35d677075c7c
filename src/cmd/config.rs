//! Configuration view and validation commands: `scout config`.

use anyhow::{Result, bail};

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use scout::config::{CliOverrides, Config, SCOUT_DIR_NAME};
    use scout::scout_config::{CONFIG_FILE_NAME, ScoutToml};

    let scout_dir = project_dir.join(SCOUT_DIR_NAME);
    let config_path = scout_dir.join(CONFIG_FILE_NAME);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Scout Configuration");
            println!("===================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                ScoutToml::load(&config_path)?
            } else {
                println!("No scout.toml found at {}; using defaults.", config_path.display());
                ScoutToml::default()
            };
            println!();
            println!("[session]");
            if let Some(cmd) = &toml.session.claude_cmd {
                println!("  claude_cmd = \"{}\"", cmd);
            }
            if let Some(model) = &toml.session.model {
                println!("  model = \"{}\"", model);
            }
            println!("  skip_permissions = {}", toml.session.skip_permissions);
            println!("  continue_delay_secs = {}", toml.session.continue_delay_secs);
            println!("  completion_marker = \"{}\"", toml.session.completion_marker);
            if let Some(level) = &toml.logging.level {
                println!();
                println!("[logging]");
                println!("  level = \"{}\"", level);
            }
            println!();

            println!("Effective values (with env overrides):");
            let config = Config::new(project_dir, CliOverrides::default())?;
            println!("  claude_cmd = \"{}\"", config.claude_cmd);
            println!("  model = \"{}\"", config.model);
            println!("  skip_permissions = {}", config.skip_permissions);
            println!();
        }
        Some(ConfigCommands::Validate) => {
            if !config_path.exists() {
                println!("No scout.toml found; defaults are valid.");
                return Ok(());
            }
            let toml = ScoutToml::load(&config_path)?;
            let problems = toml.validate();
            if problems.is_empty() {
                println!("{} is valid.", config_path.display());
            } else {
                for problem in &problems {
                    println!("  - {}", problem);
                }
                bail!("{} problem(s) in {}", problems.len(), config_path.display());
            }
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                bail!("{} already exists", config_path.display());
            }
            std::fs::create_dir_all(&scout_dir)?;
            ScoutToml::default().save(&config_path)?;
            println!("Created {}", config_path.display());
        }
    }
    Ok(())
}
