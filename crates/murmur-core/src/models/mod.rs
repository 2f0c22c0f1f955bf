//! Data models for murmur

mod backup;
mod file_record;
mod filter;
mod preset;
mod retention;

pub use backup::{BackupId, BackupReason, BackupRecord};
pub use file_record::{FileId, FileRecord, TranscriptionStatus};
pub use filter::{FilterData, FilterType};
pub use preset::{Preset, PresetId};
pub use retention::RetentionPolicy;
