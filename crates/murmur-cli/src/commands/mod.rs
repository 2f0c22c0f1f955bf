pub mod common;
pub mod completions;
pub mod config;
pub mod duplicates;
pub mod files;
pub mod presets;
