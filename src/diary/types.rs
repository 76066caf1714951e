use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Every stored record, ordered by date.
pub type RecordMap = BTreeMap<NaiveDate, DailyRecord>;

/// Date keys are stored as `YYYY-MM-DD`.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).ok()
}

pub fn format_date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mood {
    Happy,
    Excited,
    Neutral,
    Sad,
    Angry,
    #[default]
    Unset,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Excited => "excited",
            Mood::Neutral => "neutral",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Unset => "",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Mood::Unset)
    }
}

impl From<String> for Mood {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Mood::Unset)
    }
}

impl From<Mood> for String {
    fn from(mood: Mood) -> Self {
        mood.as_str().to_string()
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "excited" => Ok(Mood::Excited),
            "neutral" => Ok(Mood::Neutral),
            "sad" => Ok(Mood::Sad),
            "angry" => Ok(Mood::Angry),
            "" | "unset" | "none" => Ok(Mood::Unset),
            other => Err(format!("unknown mood: {}", other)),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            write!(f, "unset")
        } else {
            write!(f, "{}", self.as_str())
        }
    }
}

/// Decoding goes through [`StoredToDo`](crate::diary::migration::StoredToDo),
/// which accepts the older field spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    from = "crate::diary::migration::StoredToDo"
)]
pub struct ToDoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    /// Days until the next occurrence once completed, `None` means no repeat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
    /// Id of the item whose completion scheduled this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_of: Option<String>,
}

/// Everything recorded for one calendar day.
///
/// Deserializing always goes through the migration pass, so legacy shapes
/// come out in the current one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "crate::diary::migration::StoredRecord")]
pub struct DailyRecord {
    pub todo: Vec<ToDoItem>,
    pub diary: String,
    pub mood: Mood,
    pub photos: Vec<String>,
}

impl DailyRecord {
    /// True when nothing was ever written for the day.
    pub fn is_blank(&self) -> bool {
        self.todo.is_empty() && self.diary.is_empty() && self.mood.is_unset() && self.photos.is_empty()
    }
}
