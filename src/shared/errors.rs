use thiserror::Error;

/// Errors raised by the key-value backends.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access storage file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create directory: {0}")]
    DirectoryError(String),

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn directory(msg: impl Into<String>) -> Self {
        StorageError::DirectoryError(msg.into())
    }
}

/// Errors surfaced by the diary operations.
#[derive(Error, Debug)]
pub enum DiaryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Backup(#[from] crate::diary::backup::BackupError),

    #[error(transparent)]
    Settings(#[from] crate::core::settings::SettingsError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("PIN does not match")]
    PinMismatch,
}

impl DiaryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        DiaryError::NotFound(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DiaryError::InvalidInput(msg.into())
    }
}
