//! Preset backup model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::filter::FilterData;
use super::preset::Preset;
use crate::error::{Error, Result};

/// A unique identifier for a backup record, using UUID v7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackupId(Uuid);

impl BackupId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for BackupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BackupId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Why a backup was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupReason {
    /// Snapshot taken right before an import overwrote the preset
    ImportOverwrite,
}

impl BackupReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImportOverwrite => "import_overwrite",
        }
    }
}

impl FromStr for BackupReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "import_overwrite" => Ok(Self::ImportOverwrite),
            other => Err(Error::InvalidInput(format!("unknown backup reason '{other}'"))),
        }
    }
}

/// Snapshot of a preset as it was before being replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: BackupId,
    /// Name of the preset at snapshot time
    pub name: String,
    pub description: Option<String>,
    pub filter_data: FilterData,
    pub reason: BackupReason,
    /// Snapshot timestamp (Unix ms)
    pub created_at: i64,
}

impl BackupRecord {
    /// Snapshot `preset` for the given reason
    #[must_use]
    pub fn snapshot(preset: &Preset, reason: BackupReason) -> Self {
        Self {
            id: BackupId::new(),
            name: preset.name.clone(),
            description: preset.description.clone(),
            filter_data: preset.filter_data.clone(),
            reason,
            created_at: crate::util::unix_timestamp_millis_now(),
        }
    }
}
