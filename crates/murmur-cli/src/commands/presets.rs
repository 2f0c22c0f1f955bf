use std::path::{Path, PathBuf};

use chrono::{NaiveDate, SecondsFormat, Utc};
use murmur_core::export::{
    read_import_file, render_preset_json, render_presets_zip, suggested_bundle_file_name,
    PresetImportBatch,
};
use murmur_core::import_flow::{ConflictReview, ImportFlow, ImportOutcome};
use murmur_core::models::BackupId;
use murmur_core::presets::{ConflictResolution, ImportPlan, RestoreAction};
use murmur_core::services::DatabaseService;
use murmur_core::FilterData;

use crate::cli::{PresetCommands, StatusFilterArg};
use crate::commands::common::{format_backup_lines, format_preset_lines, open_database};
use crate::config::CliConfig;
use crate::error::CliError;

pub async fn run_presets(command: PresetCommands, db_path: &Path) -> Result<(), CliError> {
    match command {
        PresetCommands::List { json } => run_list(json, db_path).await,
        PresetCommands::Save {
            name,
            description,
            search,
            status,
            date,
        } => run_save(&name, description, search, status, date, db_path).await,
        PresetCommands::Export { name, output } => {
            run_export(&name, output.as_deref(), db_path).await
        }
        PresetCommands::ExportAll { output } => run_export_all(output, db_path).await,
        PresetCommands::Import {
            path,
            resolution,
            overrides,
            dry_run,
        } => {
            let default_resolution = match resolution {
                Some(resolution) => resolution.into(),
                None => {
                    CliConfig::load()
                        .map_err(CliError::Config)?
                        .default_resolution
                }
            };
            run_import(&path, default_resolution, &overrides, dry_run, db_path).await
        }
        PresetCommands::Backups { limit, json } => run_backups(limit, json, db_path).await,
        PresetCommands::Restore { id } => run_restore(&id, db_path).await,
    }
}

fn exported_at_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub async fn run_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let presets = db.list_presets().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
    } else if presets.is_empty() {
        println!("No presets saved");
    } else {
        for line in format_preset_lines(&presets) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_save(
    name: &str,
    description: Option<String>,
    search: Option<String>,
    status: StatusFilterArg,
    date: Option<NaiveDate>,
    db_path: &Path,
) -> Result<(), CliError> {
    let filter_data = FilterData {
        search_query: murmur_core::util::normalize_text_option(search),
        filter_type: status.into(),
        filter_date: date,
    };

    let db = open_database(db_path).await?;
    let preset = db.save_preset(name, description, filter_data).await?;
    println!("{}", preset.id);
    Ok(())
}

pub async fn run_export(
    name: &str,
    output_path: Option<&Path>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let preset = db
        .find_preset_by_name(name)
        .await?
        .ok_or_else(|| CliError::PresetNotFound(name.to_string()))?;
    let rendered = render_preset_json(&preset, &exported_at_now())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub async fn run_export_all(output_path: Option<PathBuf>, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let presets = db.list_presets().await?;
    let bytes = render_presets_zip(&presets, &exported_at_now())?;

    let path = output_path.unwrap_or_else(|| {
        PathBuf::from(suggested_bundle_file_name(Utc::now().timestamp_millis()))
    });
    std::fs::write(&path, bytes)?;
    println!("{}", path.display());
    Ok(())
}

pub async fn run_import(
    path: &Path,
    default_resolution: ConflictResolution,
    overrides: &[(usize, ConflictResolution)],
    dry_run: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let batch = read_import_file(path)?;
    tracing::debug!(
        "Read {} preset(s) and {} unreadable file(s) from {}",
        batch.presets.len(),
        batch.errors.len(),
        path.display()
    );
    report_file_errors(&batch);
    let batch_errors = batch.errors.len();
    if batch.presets.is_empty() {
        return Err(CliError::NothingToImport);
    }

    let db = open_database(db_path).await?;
    let flow = plan_import_flow(&db, batch, default_resolution, overrides).await?;
    let Some(plan) = flow.plan().cloned() else {
        return Err(CliError::NothingToImport);
    };

    for line in describe_plan(&plan) {
        println!("{line}");
    }
    if dry_run {
        println!("Dry run: nothing written");
        return Ok(());
    }

    let outcome = apply_flow(&db, flow, &plan).await?;
    println!("{}", describe_outcome(&outcome, batch_errors));
    Ok(())
}

fn report_file_errors(batch: &PresetImportBatch) {
    for error in &batch.errors {
        eprintln!("Skipped {}: {}", error.file, error.message);
    }
}

/// Drive the flow from `Idle` to `ResolutionChosen`.
pub async fn plan_import_flow(
    db: &DatabaseService,
    batch: PresetImportBatch,
    default_resolution: ConflictResolution,
    overrides: &[(usize, ConflictResolution)],
) -> Result<ImportFlow, CliError> {
    let existing = db.list_presets().await?;

    let mut flow = ImportFlow::default();
    flow.begin(batch.presets, existing, default_resolution)?;

    let conflicting: Vec<usize> = match &flow {
        ImportFlow::ConflictsDetected(review) => {
            review.conflicts.iter().map(|conflict| conflict.index).collect()
        }
        _ => Vec::new(),
    };
    if let Some((index, _)) = overrides
        .iter()
        .find(|(index, _)| !conflicting.contains(index))
    {
        return Err(CliError::UnusedOverride(*index));
    }

    if let ImportFlow::ConflictsDetected(review) = &flow {
        for line in describe_conflicts(review) {
            eprintln!("{line}");
        }
        for (index, resolution) in overrides {
            flow.override_item(*index, *resolution)?;
        }
        flow.choose()?;
    }

    Ok(flow)
}

async fn apply_flow(
    db: &DatabaseService,
    mut flow: ImportFlow,
    plan: &ImportPlan,
) -> Result<ImportOutcome, CliError> {
    let outcome = db.apply_import_plan(plan).await?;
    flow.mark_applied(outcome)?;
    Ok(outcome)
}

pub fn describe_conflicts(review: &ConflictReview) -> Vec<String> {
    let mut lines = vec![format!(
        "{} of {} imported preset(s) share a name with an existing preset (default: {})",
        review.conflicts.len(),
        review.incoming.len(),
        review.default_resolution
    )];
    lines.extend(
        review
            .conflicts
            .iter()
            .map(|conflict| format!("  #{}  {}", conflict.index, conflict.name)),
    );
    lines
}

pub fn describe_plan(plan: &ImportPlan) -> Vec<String> {
    let mut lines = Vec::new();
    lines.extend(
        plan.to_insert
            .iter()
            .map(|preset| format!("insert     {}", preset.name)),
    );
    lines.extend(
        plan.to_update
            .iter()
            .map(|update| format!("overwrite  {}", update.preset.name)),
    );
    if plan.skipped > 0 {
        lines.push(format!("skip       {} conflicting preset(s)", plan.skipped));
    }
    lines
}

pub fn describe_outcome(outcome: &ImportOutcome, unreadable_files: usize) -> String {
    format!(
        "Imported {} new, overwrote {} (backed up {}), skipped {}, {} unreadable file(s)",
        outcome.inserted, outcome.updated, outcome.backed_up, outcome.skipped, unreadable_files
    )
}

pub async fn run_backups(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let backups = db.list_backups(limit).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&backups)?);
    } else if backups.is_empty() {
        println!("No backups");
    } else {
        for line in format_backup_lines(&backups) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_restore(id: &str, db_path: &Path) -> Result<(), CliError> {
    let id = id
        .trim()
        .parse::<BackupId>()
        .map_err(|_| CliError::InvalidId(id.to_string()))?;
    let db = open_database(db_path).await?;

    match db.restore_backup(&id).await? {
        RestoreAction::Update { preset, .. } => println!("Restored '{}'", preset.name),
        RestoreAction::Insert(preset) => println!("Recreated '{}'", preset.name),
    }
    Ok(())
}
