//! Database layer for murmur

mod connection;
mod file_repository;
mod migrations;
mod preset_repository;
mod settings_repository;

pub use connection::Database;
pub use file_repository::{FileRecordRepository, LibSqlFileRepository};
pub use preset_repository::{LibSqlPresetRepository, PresetRepository};
pub use settings_repository::LibSqlSettingsRepository;
