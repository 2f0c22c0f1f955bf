//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use murmur_core::presets::ConflictResolution;
use murmur_core::RetentionPolicy;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub default_resolution: ConflictResolution,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
        .join(CONFIG_FILE_NAME)
}

impl CliConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self {
                version: default_config_version(),
                ..Self::default()
            });
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let serialized = serde_json::to_string_pretty(self)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.retention, RetentionPolicy::default());
        assert_eq!(config.default_resolution, ConflictResolution::Skip);
    }

    #[test]
    fn config_roundtrip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = CliConfig {
            version: 1,
            retention: RetentionPolicy {
                enabled: false,
                keep_latest: false,
                delete_older_than_days: 7,
            },
            default_resolution: ConflictResolution::Rename,
        };
        config.save_to_path(&path).unwrap();

        assert_eq!(CliConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"default_resolution":"overwrite"}"#).unwrap();

        let config = CliConfig::load_from_path(&path).unwrap();
        assert_eq!(config.default_resolution, ConflictResolution::Overwrite);
        assert_eq!(config.retention, RetentionPolicy::default());
        assert_eq!(config.version, 1);
    }

    #[test]
    fn unreadable_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{").unwrap();

        let error = CliConfig::load_from_path(&path).unwrap_err();
        assert!(error.contains("Failed to parse config"));
    }
}
