//! Saved filter payload model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::TranscriptionStatus;

/// Status bucket a filter narrows the file list to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    All,
    Completed,
    Processing,
    Pending,
    Failed,
}

impl FilterType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Processing => "processing",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }

    /// Whether a record with `status` passes this filter
    #[must_use]
    pub fn accepts(self, status: TranscriptionStatus) -> bool {
        match self {
            Self::All => true,
            Self::Completed => status == TranscriptionStatus::Completed,
            Self::Processing => status == TranscriptionStatus::Processing,
            Self::Pending => status == TranscriptionStatus::Pending,
            Self::Failed => status == TranscriptionStatus::Failed,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "processing" => Ok(Self::Processing),
            "pending" => Ok(Self::Pending),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown filter type '{other}'"))),
        }
    }
}

/// Filter criteria stored inside a preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterData {
    /// Case-insensitive title search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Status bucket
    #[serde(default)]
    pub filter_type: FilterType,
    /// Only records created on this UTC day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_date: Option<NaiveDate>,
}

impl FilterData {
    /// Whether no criterion narrows the list
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_query
            .as_deref()
            .is_none_or(|query| query.trim().is_empty())
            && self.filter_type == FilterType::All
            && self.filter_date.is_none()
    }
}
