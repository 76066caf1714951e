pub mod backup;
pub mod commands;
pub mod credentials;
pub mod helpers;
pub mod migration;
pub mod records;
pub mod types;

use crate::core::settings::{load_settings, update_storage_backend, AppSettings, StorageBackend};
use crate::shared::errors::{DiaryError, StorageError};
use crate::storage::{apply_snapshot, open_backend, take_snapshot, KeyValueStore, DIARY_KEYS};
use credentials::CredentialStore;
use records::RecordStore;
use std::path::Path;
use std::sync::Arc;

/// Owns the storage handle; every diary operation goes through here.
pub struct DiaryService {
    kv: Arc<dyn KeyValueStore>,
    records: RecordStore,
    credentials: CredentialStore,
    settings: AppSettings,
}

impl DiaryService {
    pub fn new(kv: Arc<dyn KeyValueStore>, settings: AppSettings) -> Self {
        Self {
            records: RecordStore::new(kv.clone()),
            credentials: CredentialStore::new(kv.clone()),
            kv,
            settings,
        }
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }
}

/// Load settings from `storage_dir` and open the configured backend.
pub fn init_diary(storage_dir: &Path) -> Result<DiaryService, StorageError> {
    let settings = load_settings(storage_dir);
    let kv = open_backend(settings.storage_backend, storage_dir)?;
    let service = DiaryService::new(kv, settings);

    tracing::info!(
        target: "records",
        backend = %service.settings.storage_backend,
        records = service.records.load_all().len(),
        "Diary initialized"
    );
    Ok(service)
}

/// Move the diary to `backend` and make it the configured one.
///
/// The diary keys are copied from the current backend, replacing whatever the
/// target held. The old backend keeps its copy until the next switch back
/// overwrites it. Switching to the backend already in use does nothing.
pub fn switch_backend(storage_dir: &Path, backend: StorageBackend) -> Result<AppSettings, DiaryError> {
    let settings = load_settings(storage_dir);
    if settings.storage_backend == backend {
        return Ok(settings);
    }

    // Read before opening the target: a new database moves the file store aside
    let snapshot = {
        let source = open_backend(settings.storage_backend, storage_dir)?;
        take_snapshot(source.as_ref(), &DIARY_KEYS)?
    };
    let target = open_backend(backend, storage_dir)?;
    let copied = apply_snapshot(target.as_ref(), &snapshot)?;

    let settings = update_storage_backend(storage_dir, backend)?;
    tracing::info!(
        target: "system",
        backend = %backend,
        copied,
        "Storage backend switched"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::{DATA_KEY, PASSWORD_KEY};
    use chrono::NaiveDate;

    #[test]
    fn test_switch_to_same_backend_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = switch_backend(tmp.path(), StorageBackend::File).unwrap();
        assert_eq!(settings.storage_backend, StorageBackend::File);
        assert!(!tmp.path().join("settings.json").exists());
        assert!(!tmp.path().join("diary.db").exists());
    }

    #[test]
    fn test_switch_carries_pin_and_records() {
        let tmp = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        {
            let diary = init_diary(tmp.path()).unwrap();
            diary.set_diary(day, "on file").unwrap();
            diary.change_pin("0000", "4242").unwrap();
        }

        switch_backend(tmp.path(), StorageBackend::Sqlite).unwrap();
        let sqlite = open_backend(StorageBackend::Sqlite, tmp.path()).unwrap();
        assert_eq!(sqlite.get(PASSWORD_KEY).unwrap().as_deref(), Some("4242"));
        assert!(sqlite.get(DATA_KEY).unwrap().is_some());

        let diary = init_diary(tmp.path()).unwrap();
        assert_eq!(diary.settings().storage_backend, StorageBackend::Sqlite);
        assert_eq!(diary.day(day).diary, "on file");
    }
}
