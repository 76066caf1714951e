use super::KeyValueStore;
use crate::shared::errors::StorageError;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process store, nothing touches disk.
#[derive(Default)]
pub struct MemoryStorage(RwLock<HashMap<String, String>>);

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.0.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.0.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.0.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut map = self.0.write().map_err(|_| StorageError::Poisoned)?;
        map.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn test_memory_storage_contract() {
        let store = MemoryStorage::new();
        contract::check_roundtrip(&store);
        contract::check_remove_and_clear(&store);
    }
}
