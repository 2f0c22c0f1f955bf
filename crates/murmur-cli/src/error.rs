use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] murmur_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid ID '{0}'")]
    InvalidId(String),
    #[error("Preset not found: {0}")]
    PresetNotFound(String),
    #[error("Import item {0} has no name conflict; --override only applies to conflicting items")]
    UnusedOverride(usize),
    #[error("Import contains no readable presets")]
    NothingToImport,
    #[error("Configuration error: {0}")]
    Config(String),
}
