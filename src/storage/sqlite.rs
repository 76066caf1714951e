use super::migrations;
use super::KeyValueStore;
use crate::shared::errors::StorageError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed key-value store with a thread-safe connection.
pub struct SqliteStorage(Mutex<Connection>);

impl SqliteStorage {
    /// Open (or create) the database and run migrations. A newly created
    /// database also pulls in any keys left by the file backend next to it.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let created = !db_path.exists();
        let conn = Connection::open(db_path)?;
        migrations::run_migrations(&conn)?;

        if let (true, Some(dir)) = (created, db_path.parent()) {
            if let Err(e) = migrations::import_file_store(&conn, &dir.join("store")) {
                tracing::warn!(target: "system", "Failed to import file storage: {}", e);
            }
        }

        tracing::debug!(target: "system", "Database initialized at {:?}", db_path);
        Ok(Self(Mutex::new(conn)))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self(Mutex::new(conn)))
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.0.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM kv", [])?;
        tracing::info!(target: "system", removed, "Cleared SQLite storage");
        Ok(())
    }
}
