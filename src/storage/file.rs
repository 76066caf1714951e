use super::KeyValueStore;
use crate::shared::errors::StorageError;
use crate::shared::paths::ensure_dir;
use std::fs;
use std::path::PathBuf;

/// One `<key>.json` file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key_to_filename(key)))
    }
}

/// Maps a storage key to a filename stem.
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes `%XX`.
fn key_to_filename(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    if out.is_empty() {
        "%".to_string()
    } else {
        out
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        ensure_dir(&self.dir)?;

        // Whole-file replace: write a sibling then rename over the target
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        tracing::trace!(
            target: "system",
            path = %path.display(),
            bytes = value.len(),
            "Wrote storage key"
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if !self.dir.exists() {
            return Ok(());
        }

        let mut removed = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        tracing::info!(target: "system", removed, "Cleared file storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn test_key_to_filename() {
        assert_eq!(key_to_filename("diaryData"), "diaryData");
        assert_eq!(key_to_filename("diary-password_2"), "diary-password_2");
        assert_eq!(key_to_filename("a/b"), "a%2Fb");
        assert_eq!(key_to_filename("../x"), "%2E%2E%2Fx");
        assert_eq!(key_to_filename(""), "%");
    }

    #[test]
    fn test_file_storage_contract() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStorage::new(tmp.path().join("store"));
        contract::check_roundtrip(&store);
        contract::check_remove_and_clear(&store);
    }

    #[test]
    fn test_clear_keeps_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStorage::new(tmp.path().to_path_buf());
        store.set("diaryData", "{}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "keep me").unwrap();

        store.clear().unwrap();
        assert!(tmp.path().join("notes.txt").exists());
        assert_eq!(store.get("diaryData").unwrap(), None);
    }
}
