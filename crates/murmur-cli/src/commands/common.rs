use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use murmur_core::duplicates::DuplicateGroup;
use murmur_core::services::DatabaseService;
use murmur_core::{BackupRecord, FileRecord, Preset};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct FileListItem {
    pub id: String,
    pub title: String,
    pub checksum: Option<String>,
    pub status: String,
    pub size_bytes: i64,
    pub created_at: i64,
    pub relative_time: String,
    pub protected: bool,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("MURMUR_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
        .join("murmur.db")
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    Ok(DatabaseService::open_path(path.to_path_buf()).await?)
}

pub fn parse_ids<T: FromStr>(values: &[String]) -> Result<Vec<T>, CliError> {
    values
        .iter()
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| CliError::InvalidId(value.clone()))
        })
        .collect()
}

pub fn format_file_lines(files: &[FileRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    files
        .iter()
        .map(|file| {
            let id = file.id.to_string();
            let title = truncate(&file.title, 32);
            let relative_time = format_relative_time(file.created_at, now_ms);
            let lock = if file.is_protected { "  [protected]" } else { "" };
            format!(
                "{id}  {title:<32}  {:<10}  {:>9}  {relative_time}{lock}",
                file.status.as_str(),
                format_size(file.size_bytes)
            )
        })
        .collect()
}

pub fn file_to_list_item(file: &FileRecord) -> FileListItem {
    let now_ms = Utc::now().timestamp_millis();
    FileListItem {
        id: file.id.to_string(),
        title: file.title.clone(),
        checksum: file.checksum.clone(),
        status: file.status.to_string(),
        size_bytes: file.size_bytes,
        created_at: file.created_at,
        relative_time: format_relative_time(file.created_at, now_ms),
        protected: file.is_protected,
    }
}

pub fn format_group_lines(group: &DuplicateGroup) -> Vec<String> {
    let mut lines = vec![format!(
        "checksum {} ({} copies, {} to delete)",
        group.checksum,
        group.records.len(),
        group.deletable_count()
    )];
    lines.extend(group.records.iter().map(|candidate| {
        let marker = if candidate.will_be_deleted { "x" } else { " " };
        format!(
            "  [{marker}] {}  {:<32}  {}  {}",
            candidate.record.id,
            truncate(&candidate.record.title, 32),
            format_timestamp(candidate.record.created_at),
            candidate.reason
        )
    }));
    lines
}

pub fn format_preset_lines(presets: &[Preset]) -> Vec<String> {
    presets
        .iter()
        .map(|preset| {
            let filter = &preset.filter_data;
            let mut parts = vec![format!("type={}", filter.filter_type)];
            if let Some(query) = &filter.search_query {
                parts.push(format!("search=\"{query}\""));
            }
            if let Some(date) = filter.filter_date {
                parts.push(format!("date={date}"));
            }
            let description = preset.description.as_deref().unwrap_or("");
            format!(
                "{:<24}  {:<40}  {}",
                truncate(&preset.name, 24),
                parts.join(" "),
                description
            )
        })
        .collect()
}

pub fn format_backup_lines(backups: &[BackupRecord]) -> Vec<String> {
    backups
        .iter()
        .map(|backup| {
            format!(
                "{}  {}  {:<24}  {}",
                backup.id,
                format_timestamp(backup.created_at),
                truncate(&backup.name, 24),
                backup.reason.as_str()
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_size(size_bytes: i64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if size_bytes < 1024 {
        return format!("{} B", size_bytes.max(0));
    }

    let mut value = size_bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}
