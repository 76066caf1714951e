use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "diary";

/// Get the base storage directory.
/// Returns `$DIARY_DATA_DIR`, `$XDG_DATA_HOME/diary` or the platform data dir,
/// falling back to `./.diary` when none of those can be resolved.
pub fn get_storage_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DIARY_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return PathBuf::from(xdg_data).join(APP_DIR_NAME);
        }
    }

    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR_NAME)))
}

/// Storage directory honoring an explicit override (e.g. `--data-dir`).
pub fn resolve_storage_dir(override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_storage_dir(),
    }
}

/// Get the logs directory path.
/// Returns `{storage_dir}/logs`.
pub fn get_log_dir(storage_dir: &Path) -> PathBuf {
    storage_dir.join("logs")
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
