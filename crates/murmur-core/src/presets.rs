//! Preset import planning and restore.
//!
//! [`plan_import`] decides, per incoming preset, whether it is inserted,
//! skipped, renamed, or overwrites an existing preset of the same name. The
//! plan is pure data; [`crate::services::DatabaseService::apply_import_plan`]
//! executes it with backups written before any overwrite.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{BackupReason, BackupRecord, Preset, PresetId};

/// What to do with an incoming preset whose name already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    #[default]
    Skip,
    Rename,
    Overwrite,
}

impl ConflictResolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Rename => "rename",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "rename" => Ok(Self::Rename),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(Error::InvalidInput(format!(
                "unknown conflict resolution '{other}' (expected skip, rename, or overwrite)"
            ))),
        }
    }
}

/// An incoming preset whose name matches an existing one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetConflict {
    /// Position in the incoming batch
    pub index: usize,
    pub name: String,
    pub existing_id: PresetId,
}

/// Overwrite of an existing preset, keyed by the existing id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetUpdate {
    pub id: PresetId,
    pub preset: Preset,
}

/// Side effects an import needs, in execution order: backups, updates, inserts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub to_insert: Vec<Preset>,
    pub to_update: Vec<PresetUpdate>,
    pub to_backup: Vec<BackupRecord>,
    pub skipped: usize,
}

impl ImportPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_backup.is_empty()
    }
}

/// List incoming presets whose names already exist.
#[must_use]
pub fn detect_conflicts(incoming: &[Preset], existing: &[Preset]) -> Vec<PresetConflict> {
    let existing_by_name = index_by_name(existing);
    incoming
        .iter()
        .enumerate()
        .filter_map(|(index, preset)| {
            existing_by_name
                .get(preset.name.as_str())
                .map(|existing| PresetConflict {
                    index,
                    name: preset.name.clone(),
                    existing_id: existing.id,
                })
        })
        .collect()
}

/// Decide how every incoming preset is applied.
///
/// Names are compared exactly. `overrides` maps an incoming index to the
/// resolution for that item; conflicting items without an override use
/// `default_resolution`.
#[must_use]
pub fn plan_import(
    incoming: &[Preset],
    existing: &[Preset],
    default_resolution: ConflictResolution,
    overrides: &HashMap<usize, ConflictResolution>,
) -> ImportPlan {
    let existing_by_name = index_by_name(existing);
    let mut taken: HashSet<String> = existing.iter().map(|preset| preset.name.clone()).collect();

    // Non-conflicting names are claimed up front so renames never land on them.
    let mut claimed_as_is = HashSet::new();
    for (index, preset) in incoming.iter().enumerate() {
        if !existing_by_name.contains_key(preset.name.as_str()) && taken.insert(preset.name.clone())
        {
            claimed_as_is.insert(index);
        }
    }

    let mut plan = ImportPlan::default();

    for (index, preset) in incoming.iter().enumerate() {
        let Some(current) = existing_by_name.get(preset.name.as_str()) else {
            if claimed_as_is.contains(&index) {
                plan.to_insert.push(preset.clone());
            } else {
                // Repeated name within the batch itself.
                let name = unique_name(&preset.name, &taken);
                taken.insert(name.clone());
                plan.to_insert.push(preset.renamed(name));
            }
            continue;
        };

        let resolution = overrides
            .get(&index)
            .copied()
            .unwrap_or(default_resolution);
        tracing::debug!("Preset '{}' conflicts; resolving with {resolution}", preset.name);

        match resolution {
            ConflictResolution::Skip => plan.skipped += 1,
            ConflictResolution::Rename => {
                let name = unique_name(&preset.name, &taken);
                taken.insert(name.clone());
                plan.to_insert.push(preset.renamed(name));
            }
            ConflictResolution::Overwrite => {
                plan.to_backup
                    .push(BackupRecord::snapshot(current, BackupReason::ImportOverwrite));
                plan.to_update.push(PresetUpdate {
                    id: current.id,
                    preset: Preset {
                        id: current.id,
                        created_at: current.created_at,
                        ..preset.clone()
                    },
                });
            }
        }
    }

    plan
}

/// Smallest `"{base} (n)"`, `n >= 1`, not present in `taken`.
#[must_use]
pub fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    (1u64..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// How a backup is put back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreAction {
    /// A preset with the backup's name exists; bring it back to the snapshot
    Update { id: PresetId, preset: Preset },
    /// No preset carries that name anymore
    Insert(Preset),
}

/// Plan the inverse of an overwrite.
#[must_use]
pub fn plan_restore(backup: &BackupRecord, existing: &[Preset]) -> RestoreAction {
    let now = crate::util::unix_timestamp_millis_now();
    if let Some(current) = existing.iter().find(|preset| preset.name == backup.name) {
        return RestoreAction::Update {
            id: current.id,
            preset: Preset {
                id: current.id,
                name: backup.name.clone(),
                description: backup.description.clone(),
                filter_data: backup.filter_data.clone(),
                created_at: current.created_at,
                updated_at: now,
            },
        };
    }

    RestoreAction::Insert(Preset::new(
        backup.name.clone(),
        backup.description.clone(),
        backup.filter_data.clone(),
    ))
}

// First occurrence wins when existing names are not unique.
fn index_by_name(presets: &[Preset]) -> HashMap<&str, &Preset> {
    let mut by_name = HashMap::with_capacity(presets.len());
    for preset in presets {
        by_name.entry(preset.name.as_str()).or_insert(preset);
    }
    by_name
}
