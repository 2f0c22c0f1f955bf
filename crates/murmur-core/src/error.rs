//! Error types for murmur-core

use thiserror::Error;

/// Result type alias using murmur-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in murmur-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Imported file does not match the preset export shape
    #[error("Invalid preset file format: {0}")]
    InvalidFormat(String),

    /// Delete selection mixes protected and unprotected files
    #[error(
        "Selection mixes {protected} protected and {unprotected} unprotected files; unprotect or deselect before deleting"
    )]
    MixedProtection { protected: usize, unprotected: usize },

    /// Import flow transition not allowed from the current state
    #[error("Cannot {action} while import is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// ZIP archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// CSV report error
    #[error("Report error: {0}")]
    Report(#[from] csv::Error),
}
