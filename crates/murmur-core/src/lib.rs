//! murmur-core - Core library for murmur
//!
//! This crate contains the models, the duplicate resolution engine, the preset
//! import planner, the preset archive formats, and the local database layer
//! used by the murmur CLI.

pub mod db;
pub mod duplicates;
pub mod error;
pub mod export;
pub mod filters;
pub mod import_flow;
pub mod models;
pub mod presets;
pub mod realtime;
pub mod services;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    BackupRecord, FileId, FileRecord, FilterData, FilterType, Preset, PresetId, RetentionPolicy,
};
