//! Shared database service wrapper used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, FileRecordRepository, LibSqlFileRepository, LibSqlPresetRepository,
    LibSqlSettingsRepository, PresetRepository,
};
use crate::duplicates::{self, DuplicateScan};
use crate::filters::{FilterState, FilterStateStore};
use crate::import_flow::ImportOutcome;
use crate::models::{
    BackupId, BackupRecord, FileId, FileRecord, FilterData, Preset, PresetId, RetentionPolicy,
};
use crate::presets::{plan_restore, ImportPlan, RestoreAction};
use crate::{Error, Result};

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh one is created.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Detected invalid database file at {}: {}. Moving it aside and retrying once.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_file(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Path of the backing file, `None` for in-memory services.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &Error) -> bool {
        error
            .to_string()
            .to_ascii_lowercase()
            .contains("file is not a database")
    }

    fn quarantine_corrupted_db_file(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .map_or_else(|| "murmur.db".into(), |name| name.to_string_lossy());
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted database file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }
        Ok(())
    }

    /// Add a file record.
    pub async fn create_file(&self, record: &FileRecord) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlFileRepository::new(db.connection());
        repo.create(record).await
    }

    /// Fetch a file record by id.
    pub async fn get_file(&self, id: &FileId) -> Result<Option<FileRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlFileRepository::new(db.connection());
        repo.get(id).await
    }

    /// List file records newest-first.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlFileRepository::new(db.connection());
        repo.list().await
    }

    /// Set or clear protection on a batch of files.
    pub async fn set_files_protected(&self, ids: &[FileId], is_protected: bool) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlFileRepository::new(db.connection());
        let found = repo.get_many(ids).await?;
        if let Some(missing) = first_missing(ids, &found) {
            return Err(Error::NotFound(format!("file {missing}")));
        }
        repo.set_protected(ids, is_protected).await
    }

    /// Delete a manual selection of files.
    ///
    /// The whole selection is rejected when any id is unknown or when it
    /// mixes protected and unprotected files.
    pub async fn delete_files(&self, ids: &[FileId]) -> Result<u64> {
        let db = self.db.lock().await;
        let repo = LibSqlFileRepository::new(db.connection());

        let selection = repo.get_many(ids).await?;
        if let Some(missing) = first_missing(ids, &selection) {
            return Err(Error::NotFound(format!("file {missing}")));
        }
        duplicates::validate_delete_selection(&selection)?;

        let deleted = repo.delete(ids).await?;
        tracing::info!("Deleted {deleted} files");
        Ok(deleted)
    }

    /// Group fingerprinted files and apply the retention policy.
    ///
    /// A disabled policy returns [`DuplicateScan::Disabled`] without querying.
    pub async fn scan_duplicates(
        &self,
        policy: &RetentionPolicy,
        now_ms: i64,
    ) -> Result<DuplicateScan> {
        if !policy.enabled {
            return Ok(DuplicateScan::Disabled);
        }

        let records = {
            let db = self.db.lock().await;
            let repo = LibSqlFileRepository::new(db.connection());
            repo.list_with_checksum().await?
        };
        Ok(duplicates::scan(&records, policy, now_ms))
    }

    /// List presets ordered by name.
    pub async fn list_presets(&self) -> Result<Vec<Preset>> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());
        repo.list().await
    }

    /// Find a preset by exact name.
    pub async fn find_preset_by_name(&self, name: &str) -> Result<Option<Preset>> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());
        repo.find_by_name(name).await
    }

    /// Save the given filter under a new preset name.
    pub async fn save_preset(
        &self,
        name: &str,
        description: Option<String>,
        filter_data: FilterData,
    ) -> Result<Preset> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "preset name cannot be empty".to_string(),
            ));
        }

        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());
        if repo.find_by_name(name).await?.is_some() {
            return Err(Error::InvalidInput(format!(
                "a preset named '{name}' already exists"
            )));
        }

        let preset = Preset::new(
            name,
            crate::util::normalize_text_option(description),
            filter_data,
        );
        repo.insert(&preset).await?;
        Ok(preset)
    }

    /// Delete a preset.
    pub async fn delete_preset(&self, id: &PresetId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());
        repo.delete(id).await
    }

    /// Execute an import plan: every backup, then every overwrite, then every insert.
    ///
    /// The first failure stops the sequence; steps already written stay written.
    pub async fn apply_import_plan(&self, plan: &ImportPlan) -> Result<ImportOutcome> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());

        for backup in &plan.to_backup {
            repo.insert_backup(backup).await?;
        }
        for update in &plan.to_update {
            repo.update(&update.id, &update.preset).await?;
        }
        for preset in &plan.to_insert {
            repo.insert(preset).await?;
        }

        let outcome = ImportOutcome {
            inserted: plan.to_insert.len(),
            updated: plan.to_update.len(),
            backed_up: plan.to_backup.len(),
            skipped: plan.skipped,
        };
        tracing::info!(
            "Applied preset import: {} inserted, {} overwritten, {} backed up, {} skipped",
            outcome.inserted,
            outcome.updated,
            outcome.backed_up,
            outcome.skipped
        );
        Ok(outcome)
    }

    /// List recent preset backups.
    pub async fn list_backups(&self, limit: usize) -> Result<Vec<BackupRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());
        repo.list_backups(limit).await
    }

    /// Put a backup back in place of the preset that now carries its name.
    pub async fn restore_backup(&self, id: &BackupId) -> Result<RestoreAction> {
        let db = self.db.lock().await;
        let repo = LibSqlPresetRepository::new(db.connection());

        let backup = repo
            .get_backup(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("backup {id}")))?;
        let existing = repo.list().await?;

        let action = plan_restore(&backup, &existing);
        match &action {
            RestoreAction::Update { id, preset } => repo.update(id, preset).await?,
            RestoreAction::Insert(preset) => repo.insert(preset).await?,
        }
        tracing::info!("Restored preset '{}' from backup {}", backup.name, backup.id);
        Ok(action)
    }

    /// Load the persisted filter state.
    pub async fn load_filter_state(&self) -> Result<FilterState> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.load_filter_state().await
    }

    /// Persist the filter state.
    pub async fn save_filter_state(&self, state: &FilterState) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.save_filter_state(state).await
    }
}

fn first_missing<'a>(ids: &'a [FileId], found: &[FileRecord]) -> Option<&'a FileId> {
    ids.iter()
        .find(|id| !found.iter().any(|record| record.id == **id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_flow::ImportFlow;
    use crate::models::{FilterType, TranscriptionStatus};
    use crate::presets::{ConflictResolution, PresetUpdate};
    use crate::util::DAY_MS;
    use pretty_assertions::assert_eq;

    fn file(title: &str, checksum: &str, created_at: i64, is_protected: bool) -> FileRecord {
        FileRecord {
            created_at,
            is_protected,
            status: TranscriptionStatus::Completed,
            size_bytes: 1_000,
            ..FileRecord::new(title, Some(checksum.to_string()))
        }
    }

    fn filter(filter_type: FilterType) -> FilterData {
        FilterData {
            filter_type,
            ..FilterData::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scan_then_delete_the_marked_copies() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let now = 100 * DAY_MS;

        let newest = file("Call", "abc", now - DAY_MS, false);
        let old = file("Call copy", "abc", now - 40 * DAY_MS, false);
        let unique = file("Other", "zzz", now - 40 * DAY_MS, false);
        for record in [&newest, &old, &unique] {
            service.create_file(record).await.unwrap();
        }

        let scan = service
            .scan_duplicates(&RetentionPolicy::default(), now)
            .await
            .unwrap();
        let ids = duplicates::deletable_ids(scan.groups());
        assert_eq!(ids, vec![old.id]);

        assert_eq!(service.delete_files(&ids).await.unwrap(), 1);
        assert_eq!(service.list_files().await.unwrap().len(), 2);
        assert!(service.get_file(&old.id).await.unwrap().is_none());
        assert_eq!(service.get_file(&newest.id).await.unwrap(), Some(newest));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disabled_policy_skips_the_scan() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        service
            .create_file(&file("a", "abc", 0, false))
            .await
            .unwrap();
        service
            .create_file(&file("b", "abc", 0, false))
            .await
            .unwrap();

        let policy = RetentionPolicy {
            enabled: false,
            ..RetentionPolicy::default()
        };
        let scan = service.scan_duplicates(&policy, 100 * DAY_MS).await.unwrap();
        assert_eq!(scan, DuplicateScan::Disabled);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mixed_selection_deletes_nothing() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let kept = file("a", "abc", 0, true);
        let loose = file("b", "abc", 1, false);
        service.create_file(&kept).await.unwrap();
        service.create_file(&loose).await.unwrap();

        let error = service.delete_files(&[kept.id, loose.id]).await.unwrap_err();
        assert!(matches!(
            error,
            Error::MixedProtection {
                protected: 1,
                unprotected: 1
            }
        ));
        assert_eq!(service.list_files().await.unwrap().len(), 2);

        let error = service
            .delete_files(&[loose.id, FileId::new()])
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn protect_then_scan_keeps_file() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let now = 100 * DAY_MS;
        let newest = file("a", "abc", now - 50 * DAY_MS, false);
        let old = file("b", "abc", now - 60 * DAY_MS, false);
        service.create_file(&newest).await.unwrap();
        service.create_file(&old).await.unwrap();

        service.set_files_protected(&[old.id], true).await.unwrap();
        let scan = service
            .scan_duplicates(&RetentionPolicy::default(), now)
            .await
            .unwrap();
        assert!(duplicates::deletable_ids(scan.groups()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn overwrite_import_backs_up_before_updating() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let original = service
            .save_preset("Standard", Some("old".to_string()), filter(FilterType::All))
            .await
            .unwrap();

        let incoming = vec![
            Preset::new("Standard", Some("new".to_string()), filter(FilterType::Failed)),
            Preset::new("Fresh", None, filter(FilterType::Pending)),
        ];
        let mut flow = ImportFlow::default();
        flow.begin(
            incoming,
            service.list_presets().await.unwrap(),
            ConflictResolution::Overwrite,
        )
        .unwrap();
        flow.choose().unwrap();

        let outcome = service
            .apply_import_plan(flow.plan().unwrap())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ImportOutcome {
                inserted: 1,
                updated: 1,
                backed_up: 1,
                skipped: 0,
            }
        );

        let updated = service.find_preset_by_name("Standard").await.unwrap().unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.filter_data.filter_type, FilterType::Failed);

        let backups = service.list_backups(10).await.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].description.as_deref(), Some("old"));
        assert_eq!(backups[0].filter_data.filter_type, FilterType::All);

        let action = service.restore_backup(&backups[0].id).await.unwrap();
        assert!(matches!(action, RestoreAction::Update { id, .. } if id == original.id));
        let restored = service.find_preset_by_name("Standard").await.unwrap().unwrap();
        assert_eq!(restored.filter_data.filter_type, FilterType::All);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_overwrite_keeps_backup_and_stops_before_inserts() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let original = service
            .save_preset("Standard", None, filter(FilterType::All))
            .await
            .unwrap();

        let missing_id = PresetId::new();
        let plan = ImportPlan {
            to_backup: vec![BackupRecord::snapshot(
                &original,
                crate::models::BackupReason::ImportOverwrite,
            )],
            to_update: vec![PresetUpdate {
                id: missing_id,
                preset: Preset {
                    id: missing_id,
                    ..Preset::new("Standard", None, filter(FilterType::Failed))
                },
            }],
            to_insert: vec![Preset::new("Fresh", None, filter(FilterType::Pending))],
            skipped: 0,
        };

        let result = service.apply_import_plan(&plan).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let backups = service.list_backups(10).await.unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].name, "Standard");
        assert!(service.find_preset_by_name("Fresh").await.unwrap().is_none());

        let untouched = service.find_preset_by_name("Standard").await.unwrap().unwrap();
        assert_eq!(untouched.filter_data.filter_type, FilterType::All);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restore_inserts_when_preset_was_deleted() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let original = service
            .save_preset("Weekly", None, filter(FilterType::Completed))
            .await
            .unwrap();
        let backup =
            BackupRecord::snapshot(&original, crate::models::BackupReason::ImportOverwrite);
        let plan = ImportPlan {
            to_backup: vec![backup.clone()],
            ..ImportPlan::default()
        };
        service.apply_import_plan(&plan).await.unwrap();
        service.delete_preset(&original.id).await.unwrap();

        let action = service.restore_backup(&backup.id).await.unwrap();
        assert!(matches!(action, RestoreAction::Insert(_)));
        assert_eq!(service.list_presets().await.unwrap().len(), 1);

        assert!(matches!(
            service.restore_backup(&BackupId::new()).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_preset_rejects_blank_and_taken_names() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        assert!(service
            .save_preset("  ", None, FilterData::default())
            .await
            .is_err());
        service
            .save_preset("Daily", None, FilterData::default())
            .await
            .unwrap();
        assert!(service
            .save_preset("Daily", None, FilterData::default())
            .await
            .is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn filter_state_roundtrip() {
        let service = DatabaseService::open_in_memory().await.unwrap();
        let state = FilterState::default().with_filter_type(FilterType::Processing);
        service.save_filter_state(&state).await.unwrap();
        assert_eq!(service.load_filter_state().await.unwrap(), state);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_path_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("murmur.db");

        let service = DatabaseService::open_path(&path).await.unwrap();
        assert!(service.list_files().await.unwrap().is_empty());
        assert_eq!(service.db_path(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn detects_corrupted_database_errors() {
        assert!(DatabaseService::is_corrupted_db_error(&Error::Database(
            "SQLite failure: file is not a database".to_string()
        )));
        assert!(!DatabaseService::is_corrupted_db_error(&Error::InvalidInput(
            "preset name cannot be empty".to_string()
        )));
    }

    #[test]
    fn quarantine_moves_database_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("murmur.db");
        std::fs::write(&path, b"bad-db").unwrap();

        DatabaseService::quarantine_corrupted_db_file(&path).unwrap();
        assert!(!path.exists());

        let quarantined = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .any(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("murmur.db.corrupt-")
            });
        assert!(quarantined);
    }
}
