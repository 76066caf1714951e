//! Upgrades stored records to the current shape.
//!
//! Two shapes exist on disk. The current one carries a `photos` list, the
//! legacy one a single `photo` string. Anything in `photos` that is not a
//! list counts as absent. Both may miss any other field or hold
//! garbage in it; every field falls back to its default instead of failing
//! the whole document.

use super::types::{parse_date_key, DailyRecord, Mood, RecordMap, ToDoItem};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// A record as found in storage, before migration.
///
/// Carries both photo fields; which one wins is decided in the conversion.
#[derive(Debug, Deserialize)]
pub struct StoredRecord {
    #[serde(default, deserialize_with = "lenient_list")]
    todo: Vec<ToDoItem>,
    #[serde(default, deserialize_with = "lenient")]
    diary: String,
    #[serde(default, deserialize_with = "lenient")]
    mood: Mood,
    #[serde(default)]
    photos: Option<Value>,
    /// Single photo written before galleries existed.
    #[serde(default, deserialize_with = "lenient")]
    photo: Option<String>,
}

impl From<StoredRecord> for DailyRecord {
    fn from(stored: StoredRecord) -> Self {
        // Only an actual list counts as the current shape
        let photos = match stored.photos {
            Some(Value::Array(items)) => keep_decodable(items),
            _ => stored.photo.filter(|p| !p.is_empty()).into_iter().collect(),
        };

        DailyRecord {
            todo: stored.todo,
            diary: stored.diary,
            mood: stored.mood,
            photos,
        }
    }
}

/// A to-do as found in storage. Older versions wrote `done` instead of
/// `completed` and numeric ids.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToDo {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    text: String,
    #[serde(default, deserialize_with = "lenient")]
    completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    done: Option<bool>,
    #[serde(default, deserialize_with = "positive_days")]
    repeat: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    repeat_of: Option<String>,
}

impl From<StoredToDo> for ToDoItem {
    fn from(stored: StoredToDo) -> Self {
        ToDoItem {
            id: stored.id,
            text: stored.text,
            completed: stored.completed.or(stored.done).unwrap_or(false),
            repeat: stored.repeat,
            repeat_of: stored.repeat_of,
        }
    }
}

/// Migrate one stored entry. Never fails: anything undecodable (a number,
/// `null`, a string) becomes a default record.
pub fn migrate_value(value: Value) -> DailyRecord {
    match serde_json::from_value::<StoredRecord>(value) {
        Ok(stored) => stored.into(),
        Err(e) => {
            tracing::warn!(target: "records::migration", "Replacing undecodable record: {}", e);
            DailyRecord::default()
        }
    }
}

/// Migrate every entry of a parsed document. Keys that are not
/// `YYYY-MM-DD` dates are skipped.
pub fn migrate_entries(entries: Map<String, Value>) -> RecordMap {
    let mut map = RecordMap::new();
    for (key, value) in entries {
        match parse_date_key(&key) {
            Some(date) => {
                map.insert(date, migrate_value(value));
            }
            None => {
                tracing::warn!(target: "records::migration", key = %key, "Skipping entry with invalid date key");
            }
        }
    }
    map
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

// Keeps the items that decode, drops the rest.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(keep_decodable(items)),
        _ => Ok(Vec::new()),
    }
}

fn keep_decodable<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if kept.len() < total {
        tracing::warn!(
            target: "records::migration",
            dropped = total - kept.len(),
            "Dropped malformed list entries"
        );
    }
    kept
}

// Ids written by older versions were bare millisecond numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

fn positive_days<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|days| *days > 0)
        .and_then(|days| u32::try_from(days).ok()))
}
