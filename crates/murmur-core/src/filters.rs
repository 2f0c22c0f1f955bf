//! File list filtering and the filter-state persistence seam.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{FileRecord, FilterData, FilterType};

/// Active filter selection, passed into and returned from filtering calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub filter: FilterData,
}

impl FilterState {
    #[must_use]
    pub const fn new(filter: FilterData) -> Self {
        Self { filter }
    }

    #[must_use]
    pub fn with_search(self, query: impl Into<String>) -> Self {
        let query = crate::util::normalize_text_option(Some(query.into()));
        Self {
            filter: FilterData {
                search_query: query,
                ..self.filter
            },
        }
    }

    #[must_use]
    pub fn with_filter_type(self, filter_type: FilterType) -> Self {
        Self {
            filter: FilterData {
                filter_type,
                ..self.filter
            },
        }
    }

    #[must_use]
    pub fn with_date(self, date: Option<NaiveDate>) -> Self {
        Self {
            filter: FilterData {
                filter_date: date,
                ..self.filter
            },
        }
    }

    /// Back to the unfiltered view
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn apply(&self, records: &[FileRecord]) -> Vec<FileRecord> {
        filter_records(records, &self.filter)
    }
}

/// Key-value persistence for the filter state (load at start, save on change).
#[allow(async_fn_in_trait)]
pub trait FilterStateStore {
    /// Load the saved state, or the default when nothing was saved
    async fn load_filter_state(&self) -> Result<FilterState>;

    /// Persist the state
    async fn save_filter_state(&self, state: &FilterState) -> Result<()>;
}

/// Filter records by case-insensitive title search, status, and creation day (UTC).
#[must_use]
pub fn filter_records(records: &[FileRecord], filter: &FilterData) -> Vec<FileRecord> {
    let query = filter
        .search_query
        .as_deref()
        .map(|query| query.trim().to_lowercase())
        .filter(|query| !query.is_empty());

    records
        .iter()
        .filter(|record| matches_query(record, query.as_deref()))
        .filter(|record| filter.filter_type.accepts(record.status))
        .filter(|record| matches_date(record, filter.filter_date))
        .cloned()
        .collect()
}

fn matches_query(record: &FileRecord, query: Option<&str>) -> bool {
    let Some(query) = query else {
        return true;
    };
    record.title.to_lowercase().contains(query)
}

fn matches_date(record: &FileRecord, date: Option<NaiveDate>) -> bool {
    let Some(date) = date else {
        return true;
    };
    chrono::DateTime::from_timestamp_millis(record.created_at)
        .is_some_and(|created| created.date_naive() == date)
}
