use crate::shared::errors::StorageError;
use crate::shared::paths::ensure_dir;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: i64 = 1;

/// Run database schema migrations
pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(
        "
        -- Key-value table, one row per storage key
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        ",
    )?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

    tracing::info!(
        target: "system",
        from = version,
        to = SCHEMA_VERSION,
        "Database schema migrations completed"
    );
    Ok(())
}

/// Import keys left behind by the file backend into SQLite.
///
/// Each `<key>.json` under `store_dir` whose key is not yet in the table is
/// copied over, then the directory is renamed to `store.bak` (or a
/// timestamped `store.bak-*` when that name is taken).
pub fn import_file_store(conn: &Connection, store_dir: &Path) -> Result<usize, StorageError> {
    if !store_dir.is_dir() {
        return Ok(0);
    }

    tracing::info!(
        target: "system",
        dir = %store_dir.display(),
        "Found file storage, importing into SQLite..."
    );

    let mut imported = 0usize;
    for entry in fs::read_dir(store_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        // Escaped filenames are left alone, the fixed keys never need escaping
        if key.contains('%') {
            continue;
        }

        let existing: Option<String> = conn
            .query_row("SELECT key FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        if existing.is_some() {
            continue;
        }

        let value = fs::read_to_string(&path)?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        imported += 1;
    }

    let backup_dir = backup_dir_for(store_dir);
    if let Some(parent) = backup_dir.parent() {
        ensure_dir(parent)?;
    }
    fs::rename(store_dir, &backup_dir)?;

    tracing::info!(
        target: "system",
        imported,
        backup = %backup_dir.display(),
        "File storage import completed"
    );

    Ok(imported)
}

fn backup_dir_for(store_dir: &Path) -> PathBuf {
    let plain = store_dir.with_extension("bak");
    if !plain.exists() {
        return plain;
    }
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    store_dir.with_extension(format!("bak-{}", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_import_file_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store_dir = tmp.path().join("store");
        fs::create_dir_all(&store_dir).unwrap();
        fs::write(store_dir.join("diaryData.json"), "{\"2024-01-01\":{}}").unwrap();
        fs::write(store_dir.join("diaryPassword.json"), "1234").unwrap();
        fs::write(store_dir.join("ignored.txt"), "x").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES ('diaryPassword', '9999', 0)",
            [],
        )
        .unwrap();

        let imported = import_file_store(&conn, &store_dir).unwrap();
        assert_eq!(imported, 1);
        assert!(!store_dir.exists());
        assert!(tmp.path().join("store.bak").is_dir());

        let pin: String = conn
            .query_row("SELECT value FROM kv WHERE key = 'diaryPassword'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(pin, "9999");
    }

    #[test]
    fn test_import_rotates_existing_backup_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let store_dir = tmp.path().join("store");
        let old_backup = tmp.path().join("store.bak");
        fs::create_dir_all(&old_backup).unwrap();
        fs::write(old_backup.join("diaryData.json"), "{}").unwrap();
        fs::create_dir_all(&store_dir).unwrap();
        fs::write(store_dir.join("diaryPassword.json"), "2468").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(import_file_store(&conn, &store_dir).unwrap(), 1);

        assert!(!store_dir.exists());
        assert!(old_backup.join("diaryData.json").exists());
        let rotated: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("store.bak-"))
            .collect();
        assert_eq!(rotated.len(), 1);
        assert!(rotated[0].path().join("diaryPassword.json").exists());
    }

    #[test]
    fn test_import_missing_dir_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(import_file_store(&conn, &tmp.path().join("nope")).unwrap(), 0);
    }
}
