//! TOML-based application configuration.
//!
//! Holds the settings that are not user data:
//! - Season boundary for the deadline gate
//! - Prayer time service endpoint, calculation method and coordinates
//! - Notification title and vibration pattern
//! - Reminder polling period
//!
//! Configuration is stored at `~/.config/muhasaba/config.toml`.
//! Reminder on/off and offset are user data and live in the blob store.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::season::{DeadlineGate, DEFAULT_END_MONTH, DEFAULT_END_YEAR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    #[serde(default = "default_end_month")]
    pub end_month: u32,
    #[serde(default = "default_end_year")]
    pub end_year: i32,
}

/// Prayer time lookup service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerTimesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Calculation method id understood by the service.
    #[serde(default = "default_method")]
    pub method: u32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Vibration pattern in milliseconds (on, off, on, ...).
    #[serde(default = "default_vibration")]
    pub vibration: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub season: SeasonConfig,
    #[serde(default)]
    pub prayer_times: PrayerTimesConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
}

fn default_end_month() -> u32 {
    DEFAULT_END_MONTH
}
fn default_end_year() -> i32 {
    DEFAULT_END_YEAR
}
fn default_base_url() -> String {
    "https://api.aladhan.com".into()
}
fn default_method() -> u32 {
    4
}
fn default_title() -> String {
    "Fajr prayer reminder".into()
}
fn default_vibration() -> Vec<u64> {
    vec![200, 100, 200]
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            end_month: default_end_month(),
            end_year: default_end_year(),
        }
    }
}

impl Default for PrayerTimesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            method: default_method(),
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            vibration: default_vibration(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    pub fn gate(&self) -> DeadlineGate {
        DeadlineGate::new(self.season.end_month, self.season.end_year)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reminder.poll_interval_ms.max(1))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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

    /// Load, falling back to defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Value at a dot-separated key, e.g. `season.end_month`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = lookup(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update the value at a dot-separated key, keeping the existing type.
    /// Does not persist; call [`Config::save`] afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(key, e))?;
        assign(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(key, e))?;
        Ok(())
    }
}

fn invalid(key: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn lookup<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    key.split('.').try_fold(root, |node, part| node.get(part))
}

fn assign(root: &mut serde_json::Value, key: &str, raw: &str) -> Result<(), ConfigError> {
    let (parent_path, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };

    let mut parent = root;
    if let Some(path) = parent_path {
        for part in path.split('.') {
            parent = parent
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
    }

    let obj = parent
        .as_object_mut()
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let existing = obj
        .get(leaf)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

    // `null` clears optional fields whatever they currently hold; required
    // fields reject it when the tree is decoded back.
    let parsed = match existing {
        _ if raw == "null" => serde_json::Value::Null,
        serde_json::Value::Bool(_) => raw
            .parse::<bool>()
            .map(serde_json::Value::Bool)
            .map_err(|e| invalid(key, e))?,
        serde_json::Value::Number(_) => parse_number(raw).ok_or_else(|| {
            invalid(key, format!("cannot parse '{raw}' as number"))
        })?,
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            serde_json::from_str(raw).map_err(|e| invalid(key, e))?
        }
        // Optional fields (coordinates) are null until first set.
        serde_json::Value::Null if raw.is_empty() => serde_json::Value::Null,
        serde_json::Value::Null => parse_number(raw)
            .unwrap_or_else(|| serde_json::Value::String(raw.to_string())),
        serde_json::Value::String(_) => serde_json::Value::String(raw.to_string()),
    };

    obj.insert(leaf.to_string(), parsed);
    Ok(())
}

fn parse_number(raw: &str) -> Option<serde_json::Value> {
    if let Ok(n) = raw.parse::<i64>() {
        return Some(serde_json::Value::Number(n.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
}
