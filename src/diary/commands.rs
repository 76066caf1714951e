use super::backup::{self, backup_file_name};
use super::credentials::is_valid_pin;
use super::helpers::{find_todo_mut, new_todo_id, read_photo_file};
use super::types::{DailyRecord, Mood, ToDoItem};
use super::DiaryService;
use crate::shared::errors::DiaryError;
use chrono::{Days, NaiveDate};
use std::path::{Path, PathBuf};

/// Result of toggling a to-do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub item: ToDoItem,
    /// Day the next occurrence was scheduled on, if any.
    pub repeated_on: Option<NaiveDate>,
}

impl DiaryService {
    pub fn day(&self, date: NaiveDate) -> DailyRecord {
        self.records.load_one(date)
    }

    pub fn add_todo(
        &self,
        date: NaiveDate,
        text: &str,
        repeat: Option<u32>,
    ) -> Result<ToDoItem, DiaryError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DiaryError::invalid("to-do text cannot be empty"));
        }
        check_repeat(repeat)?;

        let item = ToDoItem {
            id: new_todo_id(),
            text: text.to_string(),
            completed: false,
            repeat,
            repeat_of: None,
        };

        let pushed = item.clone();
        self.records.update(date, move |record| record.todo.push(pushed))?;

        tracing::debug!(target: "records", date = %date, id = %item.id, "To-do added");
        Ok(item)
    }

    /// Flip a to-do. Completing one with a repeat interval schedules an
    /// uncompleted copy that many days later. A copy this item already
    /// scheduled and that is still open is not scheduled again.
    pub fn toggle_todo(&self, date: NaiveDate, id: &str) -> Result<ToggleOutcome, DiaryError> {
        let mut map = self.records.load_all();

        let item = {
            let record = map
                .get_mut(&date)
                .ok_or_else(|| DiaryError::not_found(format!("to-do {} on {}", id, date)))?;
            let item = find_todo_mut(record, id)
                .ok_or_else(|| DiaryError::not_found(format!("to-do {} on {}", id, date)))?;
            item.completed = !item.completed;
            item.clone()
        };

        let mut repeated_on = None;
        if let (true, Some(days)) = (item.completed, item.repeat) {
            let next_date = date
                .checked_add_days(Days::new(u64::from(days)))
                .ok_or_else(|| DiaryError::invalid(format!("{} + {} days is out of range", date, days)))?;

            let next = map.entry(next_date).or_default();
            let already_scheduled = next.todo.iter().any(|other| {
                !other.completed && other.repeat_of.as_deref() == Some(item.id.as_str())
            });

            if already_scheduled {
                tracing::debug!(target: "records", date = %next_date, "Repeat already scheduled");
            } else {
                next.todo.push(ToDoItem {
                    id: new_todo_id(),
                    text: item.text.clone(),
                    completed: false,
                    repeat: item.repeat,
                    repeat_of: Some(item.id.clone()),
                });
                repeated_on = Some(next_date);
                tracing::info!(
                    target: "records",
                    from = %date,
                    to = %next_date,
                    "Scheduled repeating to-do"
                );
            }
        }

        self.records.save_all(&map)?;
        Ok(ToggleOutcome { item, repeated_on })
    }

    pub fn delete_todo(&self, date: NaiveDate, id: &str) -> Result<ToDoItem, DiaryError> {
        let mut record = self.records.load_one(date);
        let index = record
            .todo
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| DiaryError::not_found(format!("to-do {} on {}", id, date)))?;

        let removed = record.todo.remove(index);
        self.records.save_one(date, &record)?;
        Ok(removed)
    }

    pub fn set_repeat(
        &self,
        date: NaiveDate,
        id: &str,
        repeat: Option<u32>,
    ) -> Result<ToDoItem, DiaryError> {
        check_repeat(repeat)?;

        let mut record = self.records.load_one(date);
        let item = find_todo_mut(&mut record, id)
            .ok_or_else(|| DiaryError::not_found(format!("to-do {} on {}", id, date)))?;
        item.repeat = repeat;
        let updated = item.clone();

        self.records.save_one(date, &record)?;
        Ok(updated)
    }

    pub fn set_diary(&self, date: NaiveDate, text: &str) -> Result<(), DiaryError> {
        let text = text.to_string();
        self.records.update(date, move |record| record.diary = text)?;
        Ok(())
    }

    pub fn set_mood(&self, date: NaiveDate, mood: Mood) -> Result<(), DiaryError> {
        self.records.update(date, |record| record.mood = mood)?;
        Ok(())
    }

    /// Append a `data:` URL to the day's gallery, returning its index.
    pub fn add_photo(&self, date: NaiveDate, data_url: &str) -> Result<usize, DiaryError> {
        if !data_url.starts_with("data:") {
            return Err(DiaryError::invalid("photo must be a data: URL"));
        }

        let data_url = data_url.to_string();
        let record = self.records.update(date, move |record| record.photos.push(data_url))?;
        Ok(record.photos.len() - 1)
    }

    pub fn add_photo_file(&self, date: NaiveDate, path: &Path) -> Result<usize, DiaryError> {
        let data_url = read_photo_file(path)?;
        self.add_photo(date, &data_url)
    }

    pub fn remove_photo(&self, date: NaiveDate, index: usize) -> Result<String, DiaryError> {
        let mut record = self.records.load_one(date);
        if index >= record.photos.len() {
            return Err(DiaryError::not_found(format!("photo #{} on {}", index, date)));
        }

        let removed = record.photos.remove(index);
        self.records.save_one(date, &record)?;
        Ok(removed)
    }

    pub fn unlock(&self, pin: &str) -> bool {
        self.credentials.verify(pin)
    }

    pub fn change_pin(&self, current: &str, new_pin: &str) -> Result<(), DiaryError> {
        if !self.credentials.verify(current) {
            return Err(DiaryError::PinMismatch);
        }
        if !is_valid_pin(new_pin) {
            return Err(DiaryError::invalid("PIN must be exactly 4 digits"));
        }

        self.credentials.set_password(new_pin)?;
        Ok(())
    }

    /// File name and contents of a backup taken on `today`.
    pub fn export_backup(&self, today: NaiveDate) -> Result<(String, Vec<u8>), DiaryError> {
        let map = self.records.load_all();
        let bytes = backup::export_backup(&map)?;
        Ok((backup_file_name(&self.settings.backup_prefix, today), bytes))
    }

    pub fn write_backup(&self, dir: &Path, today: NaiveDate) -> Result<PathBuf, DiaryError> {
        let (name, bytes) = self.export_backup(today)?;
        let path = dir.join(name);
        std::fs::write(&path, bytes).map_err(backup::BackupError::from)?;
        tracing::info!(target: "backup", path = %path.display(), "Backup written");
        Ok(path)
    }

    /// Replace every record with the backup's contents. On a rejected blob
    /// nothing is written.
    pub fn restore_backup(&self, bytes: &[u8]) -> Result<usize, DiaryError> {
        let map = backup::import_backup(bytes)?;
        self.records.save_all(&map)?;
        tracing::info!(target: "backup", records = map.len(), "Backup restored");
        Ok(map.len())
    }

    pub fn restore_backup_file(&self, path: &Path) -> Result<usize, DiaryError> {
        let bytes = std::fs::read(path).map_err(backup::BackupError::from)?;
        self.restore_backup(&bytes)
    }

    /// Wipe all stored keys, records and PIN included.
    pub fn reset(&self) -> Result<(), DiaryError> {
        self.kv.clear()?;
        tracing::warn!(target: "system", "All diary data cleared");
        Ok(())
    }
}

fn check_repeat(repeat: Option<u32>) -> Result<(), DiaryError> {
    match repeat {
        Some(0) => Err(DiaryError::invalid("repeat interval must be at least 1 day")),
        _ => Ok(()),
    }
}
