use std::path::Path;

use serde::Serialize;

use crate::cli::{ConfigCommands, ResolutionArg};
use crate::config::{default_config_path, CliConfig};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    config_path: String,
    db_path: String,
    #[serde(flatten)]
    config: &'a CliConfig,
}

pub fn run_config(command: ConfigCommands, db_path: &Path) -> Result<(), CliError> {
    let path = default_config_path();
    match command {
        ConfigCommands::Show => {
            let config = CliConfig::load_from_path(&path).map_err(CliError::Config)?;
            println!("{}", render_config(&config, &path, db_path)?);
            Ok(())
        }
        ConfigCommands::Set {
            retention_enabled,
            keep_latest,
            delete_older_than_days,
            default_resolution,
        } => {
            let mut config = CliConfig::load_from_path(&path).map_err(CliError::Config)?;
            apply_config_changes(
                &mut config,
                retention_enabled,
                keep_latest,
                delete_older_than_days,
                default_resolution,
            );
            let saved_path = config.save().map_err(CliError::Config)?;
            println!("Saved {}", saved_path.display());
            Ok(())
        }
    }
}

pub fn render_config(
    config: &CliConfig,
    config_path: &Path,
    db_path: &Path,
) -> Result<String, CliError> {
    let effective = EffectiveConfig {
        config_path: config_path.display().to_string(),
        db_path: db_path.display().to_string(),
        config,
    };
    Ok(serde_json::to_string_pretty(&effective)?)
}

pub fn apply_config_changes(
    config: &mut CliConfig,
    retention_enabled: Option<bool>,
    keep_latest: Option<bool>,
    delete_older_than_days: Option<u32>,
    default_resolution: Option<ResolutionArg>,
) {
    if let Some(enabled) = retention_enabled {
        config.retention.enabled = enabled;
    }
    if let Some(keep_latest) = keep_latest {
        config.retention.keep_latest = keep_latest;
    }
    if let Some(days) = delete_older_than_days {
        config.retention.delete_older_than_days = days;
    }
    if let Some(resolution) = default_resolution {
        config.default_resolution = resolution.into();
    }
}
