use crate::shared::paths::ensure_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Storage key holding the serialized record map.
pub const DATA_KEY: &str = "diaryData";
/// Storage key holding the unlock PIN.
pub const PASSWORD_KEY: &str = "diaryPassword";
/// PIN used until the user sets one.
pub const DEFAULT_PASSWORD: &str = "0000";
pub const DEFAULT_BACKUP_PREFIX: &str = "diary-backup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(SettingsError::InvalidValue(format!(
                "unknown storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub storage_backend: StorageBackend,
    #[serde(default = "default_backup_prefix")]
    pub backup_prefix: String,
}

fn default_backup_prefix() -> String {
    DEFAULT_BACKUP_PREFIX.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::default(),
            backup_prefix: default_backup_prefix(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to write settings file: {0}")]
    WriteError(std::io::Error),
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid setting: {0}")]
    InvalidValue(String),
}

fn get_settings_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join("settings.json")
}

pub fn load_settings(storage_dir: &Path) -> AppSettings {
    let path = get_settings_path(storage_dir);

    if !path.exists() {
        return AppSettings::default();
    }

    match load_settings_from_file(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(target: "system", "Ignoring unreadable settings at {:?}: {}", path, e);
            AppSettings::default()
        }
    }
}

fn load_settings_from_file(path: &Path) -> Result<AppSettings, SettingsError> {
    let contents = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&contents)?;
    Ok(settings)
}

pub fn save_settings(storage_dir: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    ensure_dir(storage_dir).map_err(SettingsError::WriteError)?;

    let path = get_settings_path(storage_dir);
    let contents = serde_json::to_string_pretty(settings)?;
    std::fs::write(&path, contents).map_err(SettingsError::WriteError)?;
    tracing::info!(
        target: "system",
        backend = %settings.storage_backend,
        "Settings saved"
    );
    Ok(())
}

/// Validate and persist a new backup filename prefix.
pub fn update_backup_prefix(storage_dir: &Path, prefix: &str) -> Result<AppSettings, SettingsError> {
    let prefix = prefix.trim();
    if prefix.is_empty() || prefix.contains(['/', '\\']) {
        return Err(SettingsError::InvalidValue(format!(
            "invalid backup prefix: {:?}",
            prefix
        )));
    }

    let mut settings = load_settings(storage_dir);
    settings.backup_prefix = prefix.to_string();
    save_settings(storage_dir, &settings)?;
    Ok(settings)
}

pub fn update_storage_backend(
    storage_dir: &Path,
    backend: StorageBackend,
) -> Result<AppSettings, SettingsError> {
    let mut settings = load_settings(storage_dir);
    settings.storage_backend = backend;
    save_settings(storage_dir, &settings)?;
    Ok(settings)
}
