use crate::core::settings::{DEFAULT_PASSWORD, PASSWORD_KEY};
use crate::shared::errors::StorageError;
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// The unlock PIN, stored apart from the diary data.
#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The stored PIN, or `"0000"` when none was ever set or it can't be read.
    pub fn get_password(&self) -> String {
        match self.kv.get(PASSWORD_KEY) {
            Ok(Some(pin)) => pin,
            Ok(None) => DEFAULT_PASSWORD.to_string(),
            Err(e) => {
                tracing::error!(target: "credentials", "Failed to read PIN, using default: {}", e);
                DEFAULT_PASSWORD.to_string()
            }
        }
    }

    /// Overwrites the PIN. Format checks are the caller's job.
    pub fn set_password(&self, value: &str) -> Result<(), StorageError> {
        self.kv.set(PASSWORD_KEY, value)?;
        tracing::info!(target: "credentials", "PIN updated");
        Ok(())
    }

    /// Plain comparison; a mismatch is not an error and nothing is counted.
    pub fn verify(&self, candidate: &str) -> bool {
        let ok = self.get_password() == candidate;
        if !ok {
            tracing::debug!(target: "credentials", "PIN mismatch");
        }
        ok
    }
}

/// A PIN is exactly four ASCII digits.
pub fn is_valid_pin(value: &str) -> bool {
    value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit())
}
