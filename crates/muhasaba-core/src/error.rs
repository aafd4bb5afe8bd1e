//! Core error types for muhasaba-core.
//!
//! Policy rejections (season closed, session not open, duplicate
//! registration) are not errors: mutating operations return `Ok(None)` for
//! those. Everything here is a real failure of storage, configuration or an
//! external collaborator.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for muhasaba-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Blob store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anchor time acquisition errors
    #[error("Prayer time error: {0}")]
    Anchor(#[from] AnchorError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Blob store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored blob could not be decoded
    #[error("Corrupt blob under key '{key}': {message}")]
    CorruptBlob { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures while obtaining today's anchor time.
///
/// Each variant maps to a distinct user-visible message; see
/// [`AnchorError::user_message`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// The host has no way to provide coordinates
    #[error("location capability unavailable")]
    CapabilityUnavailable,

    /// The user refused the location permission
    #[error("location permission denied")]
    PermissionDenied,

    /// The prayer time service failed or returned no usable time
    #[error("prayer time lookup failed: {0}")]
    LookupFailed(String),
}

impl AnchorError {
    /// Static message shown to the user in place of the reminder time.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnchorError::CapabilityUnavailable => "This device cannot determine its location",
            AnchorError::PermissionDenied => "Please allow access to your location",
            AnchorError::LookupFailed(_) => "Something went wrong while loading prayer times",
        }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value outside its permitted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg)
                if code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for AnchorError {
    fn from(err: reqwest::Error) -> Self {
        AnchorError::LookupFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
