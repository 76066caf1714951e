pub mod file;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use crate::core::settings::{StorageBackend, DATA_KEY, PASSWORD_KEY};
use crate::shared::errors::StorageError;
use crate::shared::paths::ensure_dir;
use std::path::Path;
use std::sync::Arc;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// String key-value persistence, the local stand-in for browser storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key owned by this store.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Open the configured backend rooted at `storage_dir`.
pub fn open_backend(
    backend: StorageBackend,
    storage_dir: &Path,
) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    ensure_dir(storage_dir)
        .map_err(|e| StorageError::directory(format!("{}: {}", storage_dir.display(), e)))?;

    let store: Arc<dyn KeyValueStore> = match backend {
        StorageBackend::File => Arc::new(FileStorage::new(storage_dir.join("store"))),
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&storage_dir.join("diary.db"))?),
    };

    tracing::debug!(
        target: "system",
        backend = ?backend,
        dir = %storage_dir.display(),
        "Storage backend opened"
    );

    Ok(store)
}

/// Keys the diary keeps in storage.
pub const DIARY_KEYS: [&str; 2] = [DATA_KEY, PASSWORD_KEY];

/// Values of `keys` in `store`, `None` for keys that are not set.
pub type Snapshot = Vec<(String, Option<String>)>;

pub fn take_snapshot(store: &dyn KeyValueStore, keys: &[&str]) -> Result<Snapshot, StorageError> {
    keys.iter()
        .map(|key| Ok((key.to_string(), store.get(key)?)))
        .collect()
}

/// Make `store` match `snapshot`: set keys are written, unset ones removed.
/// Returns how many keys were written.
pub fn apply_snapshot(store: &dyn KeyValueStore, snapshot: &Snapshot) -> Result<usize, StorageError> {
    let mut written = 0usize;
    for (key, value) in snapshot {
        match value {
            Some(value) => {
                store.set(key, value)?;
                written += 1;
            }
            None => store.remove(key)?,
        }
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every backend must share.
    use super::KeyValueStore;

    pub fn check_roundtrip(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("diaryData", "{}").unwrap();
        assert_eq!(store.get("diaryData").unwrap().as_deref(), Some("{}"));

        store.set("diaryData", "{\"a\":1}").unwrap();
        assert_eq!(store.get("diaryData").unwrap().as_deref(), Some("{\"a\":1}"));
    }

    pub fn check_remove_and_clear(store: &dyn KeyValueStore) {
        store.set("one", "1").unwrap();
        store.set("two", "2").unwrap();

        store.remove("one").unwrap();
        store.remove("one").unwrap();
        assert_eq!(store.get("one").unwrap(), None);
        assert_eq!(store.get("two").unwrap().as_deref(), Some("2"));

        store.clear().unwrap();
        assert_eq!(store.get("two").unwrap(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_backend_file_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("data");
        let store = open_backend(StorageBackend::File, &root).unwrap();
        store.set("k", "v").unwrap();
        assert!(root.is_dir());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_open_backend_sqlite() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_backend(StorageBackend::Sqlite, tmp.path()).unwrap();
        store.set("k", "v").unwrap();
        assert!(tmp.path().join("diary.db").exists());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_snapshot_replaces_target_keys() {
        let source = MemoryStorage::default();
        let target = MemoryStorage::default();
        source.set(DATA_KEY, "{}").unwrap();
        target.set(DATA_KEY, "{\"stale\":1}").unwrap();
        target.set(PASSWORD_KEY, "9999").unwrap();
        target.set("unrelated", "x").unwrap();

        let snapshot = take_snapshot(&source, &DIARY_KEYS).unwrap();
        assert_eq!(apply_snapshot(&target, &snapshot).unwrap(), 1);

        assert_eq!(target.get(DATA_KEY).unwrap().as_deref(), Some("{}"));
        assert_eq!(target.get(PASSWORD_KEY).unwrap(), None);
        assert_eq!(target.get("unrelated").unwrap().as_deref(), Some("x"));
    }
}
