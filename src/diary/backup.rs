//! Backup export and restore of the whole record map.

use super::migration::migrate_entries;
use super::types::{format_date_key, RecordMap};
use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Backup is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Backup must contain a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Failed to access backup file: {0}")]
    Io(#[from] std::io::Error),
}

/// `<prefix>-<YYYY-MM-DD>.json`
pub fn backup_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.json", prefix, format_date_key(date))
}

/// Pretty-printed JSON of every record.
pub fn export_backup(map: &RecordMap) -> Result<Vec<u8>, BackupError> {
    let bytes = serde_json::to_vec_pretty(map)?;
    tracing::info!(target: "backup", records = map.len(), bytes = bytes.len(), "Backup exported");
    Ok(bytes)
}

/// Parse a backup blob.
///
/// Only checks that the top level is an object; each entry then goes through
/// the regular migration pass. Writing the result is up to the caller.
pub fn import_backup(bytes: &[u8]) -> Result<RecordMap, BackupError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        tracing::warn!(target: "backup", "Rejected backup, parse failed: {}", e);
        BackupError::Parse(e)
    })?;

    let entries = match value {
        Value::Object(entries) => entries,
        other => {
            let kind = json_kind(&other);
            tracing::warn!(target: "backup", kind, "Rejected backup, not an object");
            return Err(BackupError::NotAnObject(kind));
        }
    };

    let map = migrate_entries(entries);
    tracing::info!(target: "backup", records = map.len(), "Backup parsed");
    Ok(map)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::types::{DailyRecord, Mood};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_file_name_embeds_date() {
        assert_eq!(
            backup_file_name("diary-backup", date("2026-10-18")),
            "diary-backup-2026-10-18.json"
        );
    }

    #[test]
    fn test_export_then_import() {
        let mut map = RecordMap::new();
        map.insert(
            date("2024-07-04"),
            DailyRecord {
                diary: "fireworks".into(),
                mood: Mood::Excited,
                ..Default::default()
            },
        );

        let bytes = export_backup(&map).unwrap();
        assert_eq!(import_backup(&bytes).unwrap(), map);
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(matches!(import_backup(b"null"), Err(BackupError::NotAnObject("null"))));
        assert!(matches!(
            import_backup(b"\"just text\""),
            Err(BackupError::NotAnObject("a string"))
        ));
        assert!(matches!(import_backup(b"[1]"), Err(BackupError::NotAnObject("an array"))));
        assert!(matches!(import_backup(b"{oops"), Err(BackupError::Parse(_))));
        assert!(matches!(import_backup(b""), Err(BackupError::Parse(_))));
    }

    #[test]
    fn test_import_migrates_legacy_entries() {
        let map = import_backup(br#"{"2022-01-01":{"photo":"data:x"}}"#).unwrap();
        let record = &map[&date("2022-01-01")];
        assert_eq!(record.photos, vec!["data:x".to_string()]);
        assert_eq!(record.mood, Mood::Unset);
    }

    #[test]
    fn test_import_accepts_empty_object() {
        assert!(import_backup(b"{}").unwrap().is_empty());
    }
}
