mod config;
pub mod database;
pub mod memory;

pub use config::{
    ChannelConfig, Config, NotificationsConfig, StorageConfig, StoreConfig,
};
pub use database::Database;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Durable string-keyed blob storage, the device-local persistence seam.
///
/// Every write replaces the whole value stored under a key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory, creating it if needed.
///
/// `CRONOGRAMA_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/cronograma[-dev]/`, with `CRONOGRAMA_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("CRONOGRAMA_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env =
                std::env::var("CRONOGRAMA_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("cronograma-dev")
            } else {
                base_dir.join("cronograma")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
