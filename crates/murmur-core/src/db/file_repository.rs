//! File record repository implementation

use crate::error::{Error, Result};
use crate::models::{FileId, FileRecord};
use libsql::params::Params;
use libsql::{Connection, Value};

const FILE_COLUMNS: &str = "id, title, checksum, created_at, is_protected, status, size_bytes";

/// Trait for file record storage operations (async)
#[allow(async_fn_in_trait)]
pub trait FileRecordRepository {
    /// Insert a record as given
    async fn create(&self, record: &FileRecord) -> Result<()>;

    /// Get a record by ID
    async fn get(&self, id: &FileId) -> Result<Option<FileRecord>>;

    /// Get every record whose ID is in `ids`
    async fn get_many(&self, ids: &[FileId]) -> Result<Vec<FileRecord>>;

    /// List all records, newest first
    async fn list(&self) -> Result<Vec<FileRecord>>;

    /// List records that carry a checksum, newest first
    async fn list_with_checksum(&self) -> Result<Vec<FileRecord>>;

    /// Set or clear the protection flag for a batch of records
    async fn set_protected(&self, ids: &[FileId], is_protected: bool) -> Result<u64>;

    /// Delete a batch of records
    async fn delete(&self, ids: &[FileId]) -> Result<u64>;
}

/// libSQL implementation of `FileRecordRepository`
pub struct LibSqlFileRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFileRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_file(row: &libsql::Row) -> Result<FileRecord> {
        let id: String = row.get(0)?;
        let status: String = row.get(5)?;
        Ok(FileRecord {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid file id '{id}'")))?,
            title: row.get(1)?,
            checksum: row.get::<Option<String>>(2)?,
            created_at: row.get(3)?,
            is_protected: row.get::<i64>(4)? != 0,
            status: status.parse()?,
            size_bytes: row.get(6)?,
        })
    }

    async fn query_files(&self, sql: &str, params: Params) -> Result<Vec<FileRecord>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut files = Vec::new();
        while let Some(row) = rows.next().await? {
            files.push(Self::parse_file(&row)?);
        }
        Ok(files)
    }
}

fn id_placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn id_values(ids: &[FileId]) -> Vec<Value> {
    ids.iter().map(|id| Value::Text(id.as_str())).collect()
}

impl FileRecordRepository for LibSqlFileRepository<'_> {
    async fn create(&self, record: &FileRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO files (id, title, checksum, created_at, is_protected, status, size_bytes)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    record.id.as_str(),
                    record.title.clone(),
                    record.checksum.clone(),
                    record.created_at,
                    i64::from(record.is_protected),
                    record.status.as_str(),
                    record.size_bytes
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &FileId) -> Result<Option<FileRecord>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::parse_file(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn get_many(&self, ids: &[FileId]) -> Result<Vec<FileRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id IN ({}) ORDER BY created_at DESC",
            id_placeholders(ids.len())
        );
        self.query_files(&sql, Params::Positional(id_values(ids)))
            .await
    }

    async fn list(&self) -> Result<Vec<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files ORDER BY created_at DESC, id ASC");
        self.query_files(&sql, Params::None).await
    }

    async fn list_with_checksum(&self) -> Result<Vec<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE checksum IS NOT NULL
             ORDER BY created_at DESC, id ASC"
        );
        self.query_files(&sql, Params::None).await
    }

    async fn set_protected(&self, ids: &[FileId], is_protected: bool) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE files SET is_protected = ? WHERE id IN ({})",
            id_placeholders(ids.len())
        );
        let mut values = vec![Value::Integer(i64::from(is_protected))];
        values.extend(id_values(ids));

        let rows = self.conn.execute(&sql, Params::Positional(values)).await?;
        Ok(rows)
    }

    async fn delete(&self, ids: &[FileId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM files WHERE id IN ({})",
            id_placeholders(ids.len())
        );
        let rows = self
            .conn
            .execute(&sql, Params::Positional(id_values(ids)))
            .await?;
        Ok(rows)
    }
}
