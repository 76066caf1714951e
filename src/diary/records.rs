use super::migration::migrate_entries;
use super::types::{DailyRecord, RecordMap};
use crate::core::settings::DATA_KEY;
use crate::shared::errors::StorageError;
use crate::storage::KeyValueStore;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Date-keyed records persisted as one JSON document under [`DATA_KEY`].
///
/// Every write rewrites the whole document. `save_one` is a read-modify-write
/// without any locking, so two processes writing at once can lose one of the
/// updates. A single writer is assumed.
#[derive(Clone)]
pub struct RecordStore {
    kv: Arc<dyn KeyValueStore>,
}

impl RecordStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load and migrate every record. Never fails: a missing, unreadable or
    /// malformed document is logged and reads as an empty map.
    pub fn load_all(&self) -> RecordMap {
        let raw = match self.kv.get(DATA_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return RecordMap::new(),
            Err(e) => {
                tracing::error!(target: "records", "Failed to read stored records: {}", e);
                return RecordMap::new();
            }
        };

        if raw.trim().is_empty() {
            return RecordMap::new();
        }

        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(entries) => {
                let map = migrate_entries(entries);
                tracing::debug!(target: "records", count = map.len(), "Loaded records");
                map
            }
            Err(e) => {
                tracing::error!(target: "records", "Stored records are malformed, starting empty: {}", e);
                RecordMap::new()
            }
        }
    }

    /// The stored record for `date`, or a blank one. Nothing is written.
    pub fn load_one(&self, date: NaiveDate) -> DailyRecord {
        self.load_all().remove(&date).unwrap_or_default()
    }

    pub fn save_one(&self, date: NaiveDate, record: &DailyRecord) -> Result<(), StorageError> {
        let mut map = self.load_all();
        map.insert(date, record.clone());
        self.save_all(&map)
    }

    /// Overwrite the whole document.
    pub fn save_all(&self, map: &RecordMap) -> Result<(), StorageError> {
        let content = serde_json::to_string(map)?;
        self.kv.set(DATA_KEY, &content)?;
        tracing::debug!(target: "records", count = map.len(), "Saved records");
        Ok(())
    }

    /// Load the record for `date`, apply `f`, and persist the result.
    pub fn update<F>(&self, date: NaiveDate, f: F) -> Result<DailyRecord, StorageError>
    where
        F: FnOnce(&mut DailyRecord),
    {
        let mut map = self.load_all();
        let record = map.entry(date).or_default();
        f(record);
        let updated = record.clone();
        self.save_all(&map)?;
        Ok(updated)
    }

    /// Dates holding a record, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.load_all().into_keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::types::{Mood, ToDoItem};
    use crate::storage::MemoryStorage;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn store() -> (Arc<MemoryStorage>, RecordStore) {
        let kv = Arc::new(MemoryStorage::new());
        (kv.clone(), RecordStore::new(kv))
    }

    #[test]
    fn test_absent_document_is_empty() {
        let (_, records) = store();
        assert!(records.load_all().is_empty());
    }

    #[test]
    fn test_empty_or_malformed_document_is_empty() {
        let (kv, records) = store();
        kv.set(DATA_KEY, "").unwrap();
        assert!(records.load_all().is_empty());

        kv.set(DATA_KEY, "{broken").unwrap();
        assert!(records.load_all().is_empty());

        kv.set(DATA_KEY, "null").unwrap();
        assert!(records.load_all().is_empty());

        kv.set(DATA_KEY, "[1,2]").unwrap();
        assert!(records.load_all().is_empty());
    }

    #[test]
    fn test_load_one_does_not_write() {
        let (kv, records) = store();
        let record = records.load_one(date("2024-05-01"));
        assert_eq!(record, DailyRecord::default());
        assert_eq!(kv.get(DATA_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_one_roundtrip() {
        let (_, records) = store();
        let record = DailyRecord {
            todo: vec![ToDoItem {
                id: "1".into(),
                text: "water plants".into(),
                completed: false,
                repeat: Some(2),
                repeat_of: None,
            }],
            diary: "quiet day".into(),
            mood: Mood::Neutral,
            photos: vec!["data:image/png;base64,AAAA".into()],
        };

        records.save_one(date("2024-05-01"), &record).unwrap();
        assert_eq!(records.load_one(date("2024-05-01")), record);
    }

    #[test]
    fn test_save_one_keeps_other_days() {
        let (_, records) = store();
        let mut a = DailyRecord::default();
        a.diary = "a".into();
        let mut b = DailyRecord::default();
        b.diary = "b".into();

        records.save_one(date("2024-05-02"), &b).unwrap();
        records.save_one(date("2024-05-01"), &a).unwrap();

        assert_eq!(records.dates(), vec![date("2024-05-01"), date("2024-05-02")]);
        assert_eq!(records.load_one(date("2024-05-02")).diary, "b");
    }

    #[test]
    fn test_load_migrates_legacy_document() {
        let (kv, records) = store();
        kv.set(DATA_KEY, r#"{"2023-12-24":{"photo":"data:abc","diary":"eve"}}"#)
            .unwrap();

        let record = records.load_one(date("2023-12-24"));
        assert_eq!(record.photos, vec!["data:abc".to_string()]);
        assert_eq!(record.diary, "eve");
        assert!(record.todo.is_empty());
        assert_eq!(record.mood, Mood::Unset);
    }

    #[test]
    fn test_update_creates_and_persists() {
        let (_, records) = store();
        let updated = records
            .update(date("2024-01-01"), |r| r.mood = Mood::Happy)
            .unwrap();
        assert_eq!(updated.mood, Mood::Happy);
        assert_eq!(records.load_one(date("2024-01-01")).mood, Mood::Happy);
    }

    #[test]
    fn test_document_uses_date_string_keys() {
        let (kv, records) = store();
        records
            .save_one(date("2024-01-09"), &DailyRecord::default())
            .unwrap();
        let raw = kv.get(DATA_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("2024-01-09").is_some());
    }
}
