//! Filter preset model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::filter::FilterData;

/// A unique identifier for a preset, using UUID v7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetId(Uuid);

impl PresetId {
    /// Create a new unique preset ID using UUID v7
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

impl Default for PresetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PresetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A named, saved filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Unique identifier
    pub id: PresetId,
    /// Unique per owner, compared exactly
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Filter criteria
    pub filter_data: FilterData,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Preset {
    /// Create a new preset with a fresh id
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        filter_data: FilterData,
    ) -> Self {
        let now = crate::util::unix_timestamp_millis_now();
        Self {
            id: PresetId::new(),
            name: name.into(),
            description,
            filter_data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this preset under a different name
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
