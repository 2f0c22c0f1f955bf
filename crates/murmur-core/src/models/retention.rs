//! Duplicate retention policy

use serde::{Deserialize, Serialize};

use crate::util::DAY_MS;

/// Knobs controlling which duplicates are eligible for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// When false, duplicate analysis is not run at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Keep the newest record of every duplicate group
    pub keep_latest: bool,
    /// Records newer than this many days are never eligible
    pub delete_older_than_days: u32,
}

const fn default_enabled() -> bool {
    true
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            keep_latest: true,
            delete_older_than_days: 30,
        }
    }
}

impl RetentionPolicy {
    /// Age cutoff relative to `now_ms`; records created at or after it are too recent
    #[must_use]
    pub fn cutoff(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::from(self.delete_older_than_days).saturating_mul(DAY_MS))
    }
}
