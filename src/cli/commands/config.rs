use crate::cli::parser::Commands;
use crate::config::{Config, migrate};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate: do_migrate,
        edit_config,
        editor,
    } = cmd
    {
        let path = Config::config_file();

        if *print_config {
            info(format!("Effective configuration ({}):", path.display()));
            let yaml = serde_yaml::to_string(cfg).map_err(|_| AppError::ConfigSave)?;
            println!("{}", yaml);
        }

        if *check {
            if !path.exists() {
                warning(format!("No configuration file at {}", path.display()));
            } else {
                let missing = migrate::missing_fields(&path)?;
                if missing.is_empty() {
                    success("Configuration file is complete");
                } else {
                    warning(format!("Missing fields (defaults apply): {}", missing.join(", ")));
                }
            }
        }

        if *do_migrate {
            migrate::upgrade_config_file(&path)?;
        }

        if *edit_config {
            let default_editor = std::env::var("EDITOR")
                .or_else(|_| std::env::var("VISUAL"))
                .unwrap_or_else(|_| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });
            let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

            match Command::new(&editor_to_use).arg(&path).status() {
                Ok(s) if s.success() => {
                    success(format!("Configuration file edited using '{}'", editor_to_use));
                }
                _ => {
                    warning(format!(
                        "Editor '{}' not available, falling back to '{}'",
                        editor_to_use, default_editor
                    ));
                    let status = Command::new(&default_editor)
                        .arg(&path)
                        .status()
                        .map_err(|e| AppError::Config(e.to_string()))?;
                    if !status.success() {
                        return Err(AppError::Config(format!(
                            "editor '{}' exited with {}",
                            default_editor, status
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}
