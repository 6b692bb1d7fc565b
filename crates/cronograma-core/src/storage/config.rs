//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Storage location of the SQLite database
//! - Store behaviour (first-run seeding, force-delete verification)
//! - Notification preferences and the Android-style channel settings
//!
//! Configuration is stored at `~/.config/cronograma/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::IdentifierScheme;

/// Where the key-value database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File name inside the data directory.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Store behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed one example event when no events were ever persisted.
    #[serde(default = "default_true")]
    pub seed_example_event: bool,
    /// Re-read the persisted blob after a force delete and log mismatches.
    #[serde(default = "default_true")]
    pub verify_force_delete: bool,
}

/// Notification channel settings, applied once permission is granted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_name")]
    pub name: String,
    #[serde(default = "default_importance")]
    pub importance: String,
    #[serde(default = "default_vibration_pattern")]
    pub vibration_pattern: Vec<u32>,
    #[serde(default = "default_light_color")]
    pub light_color: String,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub identifier_scheme: IdentifierScheme,
    /// Body used when an event has no note.
    #[serde(default = "default_body")]
    pub default_body: String,
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/cronograma/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_database() -> String {
    "cronograma.db".into()
}
fn default_true() -> bool {
    true
}
fn default_channel_name() -> String {
    "default".into()
}
fn default_importance() -> String {
    "max".into()
}
fn default_vibration_pattern() -> Vec<u32> {
    vec![0, 250, 250, 250]
}
fn default_light_color() -> String {
    "#3B82F6".into()
}
fn default_body() -> String {
    "Lembrete de evento".into()
}
fn default_title_prefix() -> String {
    "📅 ".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_example_event: true,
            verify_force_delete: true,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            importance: default_importance(),
            vibration_pattern: default_vibration_pattern(),
            light_color: default_light_color(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            identifier_scheme: IdentifierScheme::default(),
            default_body: default_body(),
            title_prefix: default_title_prefix(),
            channel: ChannelConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Path of the config file inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, creating a default file if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.store.seed_example_event);
        assert_eq!(parsed.notifications.channel, ChannelConfig::default());
        assert_eq!(
            parsed.notifications.identifier_scheme,
            IdentifierScheme::EventId
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [notifications]
            enabled = false
            identifier_scheme = "title_date"
            "#,
        )
        .unwrap();
        assert!(!parsed.notifications.enabled);
        assert_eq!(
            parsed.notifications.identifier_scheme,
            IdentifierScheme::TitleDate
        );
        assert_eq!(parsed.notifications.default_body, "Lembrete de evento");
        assert_eq!(parsed.storage.database, "cronograma.db");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("store.seed_example_event").as_deref(), Some("true"));
        assert_eq!(
            cfg.get("notifications.channel.light_color").as_deref(),
            Some("#3B82F6")
        );
        assert_eq!(
            cfg.get("notifications.identifier_scheme").as_deref(),
            Some("event_id")
        );
        assert!(cfg.get("store.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("notifications.enabled", "false").unwrap();
        cfg.set("notifications.channel.vibration_pattern", "[0,100]")
            .unwrap();
        cfg.set("notifications.identifier_scheme", "title_date")
            .unwrap();
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.notifications.channel.vibration_pattern, vec![0, 100]);
        assert_eq!(
            cfg.notifications.identifier_scheme,
            IdentifierScheme::TitleDate
        );
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("store.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("store.verify_force_delete", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("notifications.identifier_scheme", "uuid"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(cfg.notifications.enabled);

        let mut changed = cfg.clone();
        changed.set("store.seed_example_event", "false").unwrap();
        changed.save_to(&path).unwrap();
        assert!(!Config::load_from(&path).unwrap().store.seed_example_event);
    }
}
