//! Preset export/import file formats and the duplicate CSV report.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::duplicates::DuplicateGroup;
use crate::error::{Error, Result};
use crate::models::{FilterData, Preset};

/// Version tag written into every exported preset.
pub const PRESET_EXPORT_VERSION: &str = "1.0";
/// Summary file inside bulk export archives.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Serialized shape of one exported preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetExport {
    pub name: String,
    pub description: Option<String>,
    pub filter_data: FilterData,
    pub exported_at: String,
    pub version: String,
}

/// Summary written next to the presets in a bulk export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_presets: usize,
    pub presets: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub description: Option<String>,
}

/// A file inside an import that could not be turned into a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFileError {
    pub file: String,
    pub message: String,
}

/// Presets parsed from an import source plus per-file failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetImportBatch {
    pub presets: Vec<Preset>,
    pub errors: Vec<ImportFileError>,
}

/// Build the export record for a preset.
#[must_use]
pub fn preset_to_export(preset: &Preset, exported_at: &str) -> PresetExport {
    PresetExport {
        name: preset.name.clone(),
        description: preset.description.clone(),
        filter_data: preset.filter_data.clone(),
        exported_at: exported_at.to_string(),
        version: PRESET_EXPORT_VERSION.to_string(),
    }
}

/// Render one preset as pretty-printed JSON.
pub fn render_preset_json(preset: &Preset, exported_at: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&preset_to_export(
        preset,
        exported_at,
    ))?)
}

/// Build a ZIP archive with one JSON file per preset and a manifest.
pub fn render_presets_zip(presets: &[Preset], exported_at: &str) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used_names = HashSet::from([MANIFEST_FILE_NAME.to_string()]);

    for preset in presets {
        let file_name = archive_file_name(&preset.name, &mut used_names);
        let body = render_preset_json(preset, exported_at)?;
        zip.start_file(file_name.as_str(), options)?;
        zip.write_all(body.as_bytes())?;
    }

    let manifest = ExportManifest {
        exported_at: exported_at.to_string(),
        total_presets: presets.len(),
        presets: presets
            .iter()
            .map(|preset| ManifestEntry {
                name: preset.name.clone(),
                description: preset.description.clone(),
            })
            .collect(),
    };
    zip.start_file(MANIFEST_FILE_NAME, options)?;
    zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

/// Suggested file name for a single preset export.
#[must_use]
pub fn suggested_preset_file_name(name: &str) -> String {
    format!("{}.json", sanitize_file_stem(name))
}

/// Suggested file name for a bulk export.
#[must_use]
pub fn suggested_bundle_file_name(timestamp_ms: i64) -> String {
    format!("murmur-presets-{timestamp_ms}.zip")
}

/// Parse one exported preset. `name` and `filter_data` are required.
pub fn parse_preset_json(payload: &str) -> Result<Preset> {
    #[derive(Deserialize)]
    struct RawPresetExport {
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        filter_data: Option<serde_json::Value>,
    }

    let raw: RawPresetExport = serde_json::from_str(payload)
        .map_err(|error| Error::InvalidFormat(format!("not a preset JSON object: {error}")))?;

    let name = raw
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| Error::InvalidFormat("missing required field 'name'".to_string()))?;
    let filter_data = raw
        .filter_data
        .filter(|value| !value.is_null())
        .ok_or_else(|| Error::InvalidFormat("missing required field 'filter_data'".to_string()))?;
    let filter_data: FilterData = serde_json::from_value(filter_data)
        .map_err(|error| Error::InvalidFormat(format!("invalid filter_data: {error}")))?;

    Ok(Preset::new(name, raw.description, filter_data))
}

/// Parse every `.json` member of a preset archive except the manifest.
///
/// Members that fail to parse are collected in `errors`; they never abort
/// the rest of the archive.
pub fn parse_presets_zip(bytes: &[u8]) -> Result<PresetImportBatch> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut batch = PresetImportBatch::default();

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(error) => {
                batch.errors.push(ImportFileError {
                    file: format!("entry #{index}"),
                    message: error.to_string(),
                });
                continue;
            }
        };

        let name = entry.name().to_string();
        if entry.is_dir() || !is_preset_member(&name) {
            continue;
        }
        if entry.enclosed_name().is_none() {
            batch.errors.push(ImportFileError {
                file: name,
                message: "unsafe archive path".to_string(),
            });
            continue;
        }

        let mut payload = String::new();
        let parsed = entry
            .read_to_string(&mut payload)
            .map_err(Error::from)
            .and_then(|_| parse_preset_json(&payload));

        match parsed {
            Ok(preset) => batch.presets.push(preset),
            Err(error) => {
                tracing::warn!("Skipping archive member {name}: {error}");
                batch.errors.push(ImportFileError {
                    file: name,
                    message: error.to_string(),
                });
            }
        }
    }

    Ok(batch)
}

/// Read an import source from disk, dispatching on its extension.
pub fn read_import_file(path: &Path) -> Result<PresetImportBatch> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") => {
            let payload = std::fs::read_to_string(path)?;
            Ok(PresetImportBatch {
                presets: vec![parse_preset_json(&payload)?],
                errors: Vec::new(),
            })
        }
        Some("zip") => parse_presets_zip(&std::fs::read(path)?),
        _ => Err(Error::InvalidFormat(format!(
            "unsupported import file {} (expected .json or .zip)",
            path.display()
        ))),
    }
}

#[derive(Serialize)]
struct DuplicateReportRow<'a> {
    checksum: &'a str,
    id: String,
    title: &'a str,
    created_at: i64,
    protected: bool,
    will_be_deleted: bool,
    reason: &'static str,
}

/// Render duplicate groups as CSV, one row per grouped record.
pub fn render_duplicate_report_csv(groups: &[DuplicateGroup]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for group in groups {
        for candidate in &group.records {
            writer.serialize(DuplicateReportRow {
                checksum: &group.checksum,
                id: candidate.record.id.to_string(),
                title: &candidate.record.title,
                created_at: candidate.record.created_at,
                protected: candidate.record.is_protected,
                will_be_deleted: candidate.will_be_deleted,
                reason: candidate.reason.as_str(),
            })?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Io(std::io::Error::other(error.to_string())))?;
    String::from_utf8(bytes).map_err(|error| Error::InvalidInput(error.to_string()))
}

fn is_preset_member(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let base = lower.rsplit('/').next().unwrap_or(&lower);
    base.ends_with(".json") && base != MANIFEST_FILE_NAME
}

fn sanitize_file_stem(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | ' ') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "preset".to_string()
    } else {
        cleaned.to_string()
    }
}

fn archive_file_name(preset_name: &str, used: &mut HashSet<String>) -> String {
    let stem = sanitize_file_stem(preset_name);
    let mut candidate = format!("{stem}.json");
    let mut counter = 2;
    while !used.insert(candidate.to_ascii_lowercase()) {
        candidate = format!("{stem}-{counter}.json");
        counter += 1;
    }
    candidate
}
