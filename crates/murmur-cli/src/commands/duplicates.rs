use std::path::Path;

use chrono::Utc;
use murmur_core::duplicates::{deletable_ids, DuplicateGroup, DuplicateScan, DuplicateSummary};
use murmur_core::export::render_duplicate_report_csv;
use murmur_core::RetentionPolicy;
use serde::Serialize;

use crate::commands::common::{format_group_lines, format_size, open_database};
use crate::config::CliConfig;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct DuplicateReport<'a> {
    pub enabled: bool,
    pub policy: RetentionPolicy,
    pub summary: DuplicateSummary,
    pub groups: &'a [DuplicateGroup],
}

pub async fn run_duplicates(
    as_json: bool,
    csv_path: Option<&Path>,
    delete: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let config = CliConfig::load().map_err(CliError::Config)?;
    run_duplicates_with_policy(&config.retention, as_json, csv_path, delete, db_path).await
}

pub async fn run_duplicates_with_policy(
    policy: &RetentionPolicy,
    as_json: bool,
    csv_path: Option<&Path>,
    delete: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let now_ms = Utc::now().timestamp_millis();
    let scan = db.scan_duplicates(policy, now_ms).await?;

    let groups = scan.groups();
    let summary = DuplicateSummary::from_groups(groups);

    if let Some(path) = csv_path {
        std::fs::write(path, render_duplicate_report_csv(groups)?)?;
        eprintln!("Wrote report to {}", path.display());
    }

    if as_json {
        let report = DuplicateReport {
            enabled: !matches!(scan, DuplicateScan::Disabled),
            policy: *policy,
            summary,
            groups,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in render_scan_lines(&scan, &summary) {
            println!("{line}");
        }
    }

    if delete {
        let ids = deletable_ids(groups);
        if ids.is_empty() {
            println!("Nothing to delete");
        } else {
            let deleted = db.delete_files(&ids).await?;
            println!("Deleted {deleted} duplicate file(s)");
        }
    }

    Ok(())
}

pub fn render_scan_lines(scan: &DuplicateScan, summary: &DuplicateSummary) -> Vec<String> {
    match scan {
        DuplicateScan::Disabled => vec![
            "Duplicate retention is disabled. Enable it with `murmur config set --retention-enabled true`."
                .to_string(),
        ],
        DuplicateScan::Groups(groups) if groups.is_empty() => {
            vec!["No duplicates found".to_string()]
        }
        DuplicateScan::Groups(groups) => {
            let mut lines = Vec::new();
            for group in groups {
                lines.extend(format_group_lines(group));
            }
            lines.push(format!(
                "{} group(s), {} file(s), {} marked for deletion, {} reclaimable",
                summary.groups,
                summary.duplicate_records,
                summary.deletable_records,
                format_size(summary.reclaimable_bytes)
            ));
            lines
        }
    }
}
