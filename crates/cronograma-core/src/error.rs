//! Core error types for cronograma-core.
//!
//! This module defines the error hierarchy using thiserror. Only the
//! awaited store operations (force deletes, flush) and the notification
//! scheduler surface these to callers; background persistence failures
//! are logged instead.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cronograma-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistent storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Notification scheduling errors
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
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

    /// A collection could not be serialized for storage
    #[error("Serialization failed for '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Any other adapter failure (non-SQLite backends)
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

/// Notification scheduling errors.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The user (or configuration) refused notification permission
    #[error("Notification permission not granted")]
    PermissionDenied,

    /// The computed fire time is now or already past
    #[error("Cannot schedule a notification in the past (fire time {fire_at})")]
    NotInFuture { fire_at: chrono::NaiveDateTime },

    /// The date/time pair could not be turned into a local instant
    #[error("Invalid notification time: {0}")]
    InvalidTime(String),

    /// The OS-level backend failed
    #[error("Notification backend failure: {0}")]
    Backend(String),
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// The data directory could not be determined or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<ValidationError> for NotificationError {
    fn from(err: ValidationError) -> Self {
        NotificationError::InvalidTime(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
