use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use murmur_core::models::TranscriptionStatus;
use murmur_core::presets::ConflictResolution;
use murmur_core::FilterType;

#[derive(Parser)]
#[command(name = "murmur")]
#[command(about = "Housekeeping for transcription files and saved filter presets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage transcription file records
    Files {
        #[command(subcommand)]
        command: FileCommands,
    },
    /// Find files sharing a checksum and show which copies the retention policy would delete
    #[command(alias = "dupes")]
    Duplicates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Also write a CSV report to this path
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
        /// Delete every copy marked for deletion
        #[arg(long)]
        delete: bool,
    },
    /// Manage saved filter presets
    Presets {
        #[command(subcommand)]
        command: PresetCommands,
    },
    /// Show or change CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum FileCommands {
    /// Register a file record
    Add {
        /// Display title
        title: String,
        /// Precomputed content checksum
        #[arg(long)]
        checksum: Option<String>,
        /// Transcription status
        #[arg(long, value_enum, default_value_t = StatusArg::Completed)]
        status: StatusArg,
        /// File size in bytes
        #[arg(long, default_value = "0")]
        size_bytes: i64,
        /// Creation time as Unix milliseconds (now when omitted)
        #[arg(long, value_name = "MS")]
        created_at: Option<i64>,
        /// Protect the record from deletion
        #[arg(long)]
        protected: bool,
    },
    /// List file records through the saved filter
    List {
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Status filter
        #[arg(long, value_enum)]
        status: Option<StatusFilterArg>,
        /// Only files created on this UTC day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
        /// Reset the saved filter before listing
        #[arg(long)]
        clear: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Protect files from deletion
    Protect {
        /// File IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove deletion protection
    Unprotect {
        /// File IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Delete a selection of files
    Delete {
        /// File IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PresetCommands {
    /// List saved presets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a filter as a new preset
    Save {
        /// Preset name
        name: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
        /// Case-insensitive title search
        #[arg(long)]
        search: Option<String>,
        /// Status filter
        #[arg(long, value_enum, default_value_t = StatusFilterArg::All)]
        status: StatusFilterArg,
        /// Only files created on this UTC day (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Export one preset as JSON
    Export {
        /// Preset name
        name: String,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Export every preset into a ZIP bundle
    ExportAll {
        /// Output path (a timestamped file in the current directory when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import presets from a .json file or a .zip bundle
    Import {
        /// File to import
        path: PathBuf,
        /// How to handle name conflicts (configured default when omitted)
        #[arg(long, value_enum)]
        resolution: Option<ResolutionArg>,
        /// Per-item resolution for a conflicting import index, e.g. `2=overwrite`
        #[arg(long = "override", value_name = "INDEX=RESOLUTION", value_parser = parse_override)]
        overrides: Vec<(usize, ConflictResolution)>,
        /// Show the plan without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List backups taken before overwrites
    Backups {
        /// Number of backups to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore a preset from a backup
    Restore {
        /// Backup ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Update configuration values
    Set {
        /// Turn duplicate retention on or off
        #[arg(long, value_name = "BOOL")]
        retention_enabled: Option<bool>,
        /// Always keep the newest copy of each duplicate group
        #[arg(long, value_name = "BOOL")]
        keep_latest: Option<bool>,
        /// Copies newer than this many days are never deleted
        #[arg(long, value_name = "DAYS")]
        delete_older_than_days: Option<u32>,
        /// Default conflict resolution for imports
        #[arg(long, value_enum)]
        default_resolution: Option<ResolutionArg>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl From<StatusArg> for TranscriptionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Processing => Self::Processing,
            StatusArg::Completed => Self::Completed,
            StatusArg::Failed => Self::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusFilterArg {
    All,
    Completed,
    Processing,
    Pending,
    Failed,
}

impl From<StatusFilterArg> for FilterType {
    fn from(value: StatusFilterArg) -> Self {
        match value {
            StatusFilterArg::All => Self::All,
            StatusFilterArg::Completed => Self::Completed,
            StatusFilterArg::Processing => Self::Processing,
            StatusFilterArg::Pending => Self::Pending,
            StatusFilterArg::Failed => Self::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ResolutionArg {
    Skip,
    Rename,
    Overwrite,
}

impl From<ResolutionArg> for ConflictResolution {
    fn from(value: ResolutionArg) -> Self {
        match value {
            ResolutionArg::Skip => Self::Skip,
            ResolutionArg::Rename => Self::Rename,
            ResolutionArg::Overwrite => Self::Overwrite,
        }
    }
}

pub fn parse_override(value: &str) -> Result<(usize, ConflictResolution), String> {
    let (index, resolution) = value
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=RESOLUTION, got '{value}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|error| format!("invalid import index '{index}': {error}"))?;
    let resolution = resolution
        .parse::<ConflictResolution>()
        .map_err(|error| error.to_string())?;
    Ok((index, resolution))
}
