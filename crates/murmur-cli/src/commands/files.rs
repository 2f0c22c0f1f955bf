use std::path::Path;

use chrono::{NaiveDate, Utc};
use murmur_core::filters::FilterState;
use murmur_core::{FileId, FileRecord};

use crate::cli::{FileCommands, StatusArg, StatusFilterArg};
use crate::commands::common::{
    file_to_list_item, format_file_lines, open_database, parse_ids, FileListItem,
};
use crate::error::CliError;

pub async fn run_files(command: FileCommands, db_path: &Path) -> Result<(), CliError> {
    match command {
        FileCommands::Add {
            title,
            checksum,
            status,
            size_bytes,
            created_at,
            protected,
        } => {
            let record =
                build_file_record(&title, checksum, status, size_bytes, created_at, protected);
            run_add(&record, db_path).await
        }
        FileCommands::List {
            search,
            status,
            date,
            clear,
            json,
        } => run_list(search, status, date, clear, json, db_path).await,
        FileCommands::Protect { ids } => run_set_protected(&ids, true, db_path).await,
        FileCommands::Unprotect { ids } => run_set_protected(&ids, false, db_path).await,
        FileCommands::Delete { ids } => run_delete(&ids, db_path).await,
    }
}

pub fn build_file_record(
    title: &str,
    checksum: Option<String>,
    status: StatusArg,
    size_bytes: i64,
    created_at: Option<i64>,
    protected: bool,
) -> FileRecord {
    FileRecord {
        status: status.into(),
        size_bytes: size_bytes.max(0),
        created_at: created_at.unwrap_or_else(|| Utc::now().timestamp_millis()),
        is_protected: protected,
        ..FileRecord::new(title.trim(), checksum)
    }
}

pub async fn run_add(record: &FileRecord, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    db.create_file(record).await?;
    println!("{}", record.id);
    Ok(())
}

/// Merge the flags into the saved filter state; the result is persisted when it changed.
pub fn next_filter_state(
    saved: FilterState,
    search: Option<String>,
    status: Option<StatusFilterArg>,
    date: Option<NaiveDate>,
    clear: bool,
) -> FilterState {
    let mut state = if clear { FilterState::cleared() } else { saved };
    if let Some(query) = search {
        state = state.with_search(query);
    }
    if let Some(status) = status {
        state = state.with_filter_type(status.into());
    }
    if date.is_some() {
        state = state.with_date(date);
    }
    state
}

pub async fn run_list(
    search: Option<String>,
    status: Option<StatusFilterArg>,
    date: Option<NaiveDate>,
    clear: bool,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;

    let saved = db.load_filter_state().await?;
    let state = next_filter_state(saved.clone(), search, status, date, clear);
    if state != saved {
        db.save_filter_state(&state).await?;
    }

    let files = state.apply(&db.list_files().await?);

    if as_json {
        let json_items = files
            .iter()
            .map(file_to_list_item)
            .collect::<Vec<FileListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        if !state.filter.is_empty() {
            eprintln!("Filter: {}", describe_filter(&state));
        }
        for line in format_file_lines(&files) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn describe_filter(state: &FilterState) -> String {
    let filter = &state.filter;
    let mut parts = vec![format!("status={}", filter.filter_type)];
    if let Some(query) = &filter.search_query {
        parts.push(format!("search=\"{query}\""));
    }
    if let Some(date) = filter.filter_date {
        parts.push(format!("date={date}"));
    }
    parts.join(" ")
}

pub async fn run_set_protected(
    ids: &[String],
    is_protected: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let ids = parse_ids::<FileId>(ids)?;
    let db = open_database(db_path).await?;
    let updated = db.set_files_protected(&ids, is_protected).await?;

    let verb = if is_protected { "Protected" } else { "Unprotected" };
    println!("{verb} {updated} file(s)");
    Ok(())
}

pub async fn run_delete(ids: &[String], db_path: &Path) -> Result<(), CliError> {
    let ids = parse_ids::<FileId>(ids)?;
    let db = open_database(db_path).await?;
    let deleted = db.delete_files(&ids).await?;
    println!("Deleted {deleted} file(s)");
    Ok(())
}
