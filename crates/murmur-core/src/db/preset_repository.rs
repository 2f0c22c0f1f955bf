//! Preset and preset backup repository implementation

use crate::error::{Error, Result};
use crate::models::{BackupId, BackupRecord, Preset, PresetId};
use libsql::Connection;

/// Trait for preset storage operations (async)
#[allow(async_fn_in_trait)]
pub trait PresetRepository {
    /// List all presets ordered by name
    async fn list(&self) -> Result<Vec<Preset>>;

    /// Get a preset by ID
    async fn get(&self, id: &PresetId) -> Result<Option<Preset>>;

    /// Find the preset with exactly this name
    async fn find_by_name(&self, name: &str) -> Result<Option<Preset>>;

    /// Insert a new preset
    async fn insert(&self, preset: &Preset) -> Result<()>;

    /// Replace the stored content of preset `id`
    async fn update(&self, id: &PresetId, preset: &Preset) -> Result<()>;

    /// Delete a preset
    async fn delete(&self, id: &PresetId) -> Result<()>;

    /// Store a backup snapshot
    async fn insert_backup(&self, backup: &BackupRecord) -> Result<()>;

    /// List backups, newest first
    async fn list_backups(&self, limit: usize) -> Result<Vec<BackupRecord>>;

    /// Get a backup by ID
    async fn get_backup(&self, id: &BackupId) -> Result<Option<BackupRecord>>;
}

/// libSQL implementation of `PresetRepository`
pub struct LibSqlPresetRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPresetRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_preset(row: &libsql::Row) -> Result<Preset> {
        let id: String = row.get(0)?;
        let filter_data: String = row.get(3)?;
        Ok(Preset {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid preset id '{id}'")))?,
            name: row.get(1)?,
            description: row.get::<Option<String>>(2)?,
            filter_data: serde_json::from_str(&filter_data)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn parse_backup(row: &libsql::Row) -> Result<BackupRecord> {
        let id: String = row.get(0)?;
        let filter_data: String = row.get(3)?;
        let reason: String = row.get(4)?;
        Ok(BackupRecord {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid backup id '{id}'")))?,
            name: row.get(1)?,
            description: row.get::<Option<String>>(2)?,
            filter_data: serde_json::from_str(&filter_data)?,
            reason: reason.parse()?,
            created_at: row.get(5)?,
        })
    }

    async fn query_one(&self, sql: &str, key: String) -> Result<Option<Preset>> {
        let mut rows = self.conn.query(sql, [key]).await?;
        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_preset(&row)?))
        } else {
            Ok(None)
        }
    }
}

impl PresetRepository for LibSqlPresetRepository<'_> {
    async fn list(&self) -> Result<Vec<Preset>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, filter_data, created_at, updated_at
                 FROM presets ORDER BY name ASC",
                (),
            )
            .await?;

        let mut presets = Vec::new();
        while let Some(row) = rows.next().await? {
            presets.push(Self::parse_preset(&row)?);
        }
        Ok(presets)
    }

    async fn get(&self, id: &PresetId) -> Result<Option<Preset>> {
        self.query_one(
            "SELECT id, name, description, filter_data, created_at, updated_at
             FROM presets WHERE id = ?",
            id.as_str(),
        )
        .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Preset>> {
        self.query_one(
            "SELECT id, name, description, filter_data, created_at, updated_at
             FROM presets WHERE name = ?",
            name.to_string(),
        )
        .await
    }

    async fn insert(&self, preset: &Preset) -> Result<()> {
        let filter_data = serde_json::to_string(&preset.filter_data)?;
        self.conn
            .execute(
                "INSERT INTO presets (id, name, description, filter_data, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    preset.id.as_str(),
                    preset.name.clone(),
                    preset.description.clone(),
                    filter_data,
                    preset.created_at,
                    preset.updated_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn update(&self, id: &PresetId, preset: &Preset) -> Result<()> {
        let filter_data = serde_json::to_string(&preset.filter_data)?;
        let rows = self
            .conn
            .execute(
                "UPDATE presets
                 SET name = ?, description = ?, filter_data = ?, updated_at = ?
                 WHERE id = ?",
                libsql::params![
                    preset.name.clone(),
                    preset.description.clone(),
                    filter_data,
                    preset.updated_at,
                    id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("preset {id}")));
        }
        Ok(())
    }

    async fn delete(&self, id: &PresetId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM presets WHERE id = ?", [id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("preset {id}")));
        }
        Ok(())
    }

    async fn insert_backup(&self, backup: &BackupRecord) -> Result<()> {
        let filter_data = serde_json::to_string(&backup.filter_data)?;
        self.conn
            .execute(
                "INSERT INTO preset_backups (id, name, description, filter_data, reason, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    backup.id.as_str(),
                    backup.name.clone(),
                    backup.description.clone(),
                    filter_data,
                    backup.reason.as_str(),
                    backup.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_backups(&self, limit: usize) -> Result<Vec<BackupRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, filter_data, reason, created_at
                 FROM preset_backups
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?",
                [limit],
            )
            .await?;

        let mut backups = Vec::new();
        while let Some(row) = rows.next().await? {
            backups.push(Self::parse_backup(&row)?);
        }
        Ok(backups)
    }

    async fn get_backup(&self, id: &BackupId) -> Result<Option<BackupRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, filter_data, reason, created_at
                 FROM preset_backups WHERE id = ?",
                [id.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_backup(&row)?))
        } else {
            Ok(None)
        }
    }
}
