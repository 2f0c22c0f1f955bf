//! Key-value settings repository implementation

use crate::error::{Error, Result};
use crate::filters::{FilterState, FilterStateStore};
use libsql::Connection;

const FILTER_STATE_KEY: &str = "filter_state";

/// libSQL implementation of the key-value settings store
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Read a raw value, `NotFound` when the key was never written
    pub async fn get_setting(&self, key: &str) -> Result<String> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(value)
        } else {
            Err(Error::NotFound(key.to_string()))
        }
    }

    /// Write a raw value, replacing any previous one
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }
}

impl FilterStateStore for LibSqlSettingsRepository<'_> {
    async fn load_filter_state(&self) -> Result<FilterState> {
        match self.get_setting(FILTER_STATE_KEY).await {
            Ok(value) => Ok(serde_json::from_str(&value).unwrap_or_else(|error| {
                tracing::warn!("Ignoring unreadable filter state: {error}");
                FilterState::default()
            })),
            Err(Error::NotFound(_)) => Ok(FilterState::default()),
            Err(error) => Err(error),
        }
    }

    async fn save_filter_state(&self, state: &FilterState) -> Result<()> {
        let value = serde_json::to_string(state)?;
        self.set_setting(FILTER_STATE_KEY, &value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::FilterType;
    use chrono::NaiveDate;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_filter_state_is_default() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let state = repo.load_filter_state().await.unwrap();
        assert_eq!(state, FilterState::default());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_and_load_filter_state() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        let state = FilterState::default()
            .with_search("standup")
            .with_filter_type(FilterType::Failed)
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 1));
        repo.save_filter_state(&state).await.unwrap();

        assert_eq!(repo.load_filter_state().await.unwrap(), state);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_corrupt_filter_state_falls_back_to_default() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        repo.set_setting(FILTER_STATE_KEY, "{not json").await.unwrap();
        assert_eq!(
            repo.load_filter_state().await.unwrap(),
            FilterState::default()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_raw_settings() {
        let db = setup().await;
        let repo = LibSqlSettingsRepository::new(db.connection());

        assert!(matches!(
            repo.get_setting("missing").await,
            Err(Error::NotFound(_))
        ));
        repo.set_setting("theme", "dark").await.unwrap();
        repo.set_setting("theme", "light").await.unwrap();
        assert_eq!(repo.get_setting("theme").await.unwrap(), "light");
    }
}
