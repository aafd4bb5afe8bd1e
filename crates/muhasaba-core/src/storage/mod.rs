mod config;
pub mod database;

pub use config::{Config, NotificationsConfig, PrayerTimesConfig, ReminderConfig, SeasonConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;

/// Blob keys, one per category. Each is rewritten whole on every change.
pub mod keys {
    pub const TALLY: &str = "tally";
    pub const ATTENDANCE: &str = "attendance";
    pub const PRAYER_HISTORY: &str = "prayer_history";
    pub const GOALS: &str = "goals";
    pub const REMINDERS: &str = "reminders";
}

/// Whole-value key/blob storage.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn has(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Volatile store for tests and embedding hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(key))
    }
}

/// Returns `~/.config/muhasaba[-dev]/` based on MUHASABA_ENV.
///
/// Set MUHASABA_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let dir = match std::env::var("MUHASABA_ENV").as_deref() {
        Ok("dev") => base_dir.join("muhasaba-dev"),
        _ => base_dir.join("muhasaba"),
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
