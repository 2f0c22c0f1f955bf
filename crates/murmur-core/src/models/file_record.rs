//! Transcription file record model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A unique identifier for a file record, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(Uuid);

impl FileId {
    /// Create a new unique file ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Processing state of a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!(
                "unknown transcription status '{other}'"
            ))),
        }
    }
}

/// An uploaded audio file and its transcription job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique identifier
    pub id: FileId,
    /// Display name, not unique
    pub title: String,
    /// Precomputed content fingerprint; `None` excludes the record from duplicate analysis
    pub checksum: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Protected records are never marked for deletion
    pub is_protected: bool,
    /// Transcription job state
    pub status: TranscriptionStatus,
    /// Original upload size in bytes
    pub size_bytes: i64,
}

impl FileRecord {
    /// Create a new unprotected, pending record created now
    #[must_use]
    pub fn new(title: impl Into<String>, checksum: Option<String>) -> Self {
        Self {
            id: FileId::new(),
            title: title.into(),
            checksum: crate::util::normalize_text_option(checksum),
            created_at: crate::util::unix_timestamp_millis_now(),
            is_protected: false,
            status: TranscriptionStatus::Pending,
            size_bytes: 0,
        }
    }

    /// Whether the record takes part in duplicate analysis
    #[must_use]
    pub const fn has_checksum(&self) -> bool {
        self.checksum.is_some()
    }
}
