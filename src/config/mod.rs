use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::core::services::{sales_service::DEFAULT_TRANSACTION_ATTEMPTS, DeletePolicy};
use crate::storage::json_backend::DEFAULT_RETENTION;
use crate::utils::paths;

const TMP_SUFFIX: &str = "tmp";
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unknown setting `{0}`")]
    UnknownKey(String),
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// User-tunable settings persisted next to the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Offset from UTC, in minutes, used to derive calendar dates of sales.
    pub utc_offset_minutes: i32,
    pub delete_policy: DeletePolicy,
    pub transaction_attempts: u32,
    pub backup_retention: usize,
    pub recent_sales_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            utc_offset_minutes: 0,
            delete_policy: DeletePolicy::default(),
            transaction_attempts: DEFAULT_TRANSACTION_ATTEMPTS,
            backup_retention: DEFAULT_RETENTION,
            recent_sales_limit: 10,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 7] = [
        "locale",
        "currency",
        "utc_offset_minutes",
        "delete_policy",
        "transaction_attempts",
        "backup_retention",
        "recent_sales_limit",
    ];

    /// Key/value pairs in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("locale", self.locale.clone()),
            ("currency", self.currency.clone()),
            ("utc_offset_minutes", self.utc_offset_minutes.to_string()),
            (
                "delete_policy",
                match self.delete_policy {
                    DeletePolicy::Restrict => "restrict".into(),
                    DeletePolicy::Orphan => "orphan".into(),
                },
            ),
            ("transaction_attempts", self.transaction_attempts.to_string()),
            ("backup_retention", self.backup_retention.to_string()),
            ("recent_sales_limit", self.recent_sales_limit.to_string()),
        ]
    }

    /// Parses and applies a single setting.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "locale" => {
                if value.is_empty() {
                    return Err(invalid("locale cannot be empty"));
                }
                self.locale = value.to_string();
            }
            "currency" => {
                if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid("expected a three-letter ISO code"));
                }
                self.currency = value.to_ascii_uppercase();
            }
            "utc_offset_minutes" => {
                let minutes: i32 = value.parse().map_err(|_| invalid("expected minutes"))?;
                if minutes.abs() > MAX_OFFSET_MINUTES {
                    return Err(invalid("offset must be within ±14 hours"));
                }
                self.utc_offset_minutes = minutes;
            }
            "delete_policy" => {
                self.delete_policy = value.parse().map_err(|err: String| invalid(&err))?;
            }
            "transaction_attempts" => {
                self.transaction_attempts = parse_positive(value).ok_or_else(|| invalid("expected a positive number"))?;
            }
            "backup_retention" => {
                self.backup_retention = parse_positive(value).ok_or_else(|| invalid("expected a positive number"))?;
            }
            "recent_sales_limit" => {
                self.recent_sales_limit = parse_positive(value).ok_or_else(|| invalid("expected a positive number"))?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn parse_positive<T: std::str::FromStr + PartialOrd + Default>(value: &str) -> Option<T> {
    value.parse::<T>().ok().filter(|parsed| *parsed > T::default())
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at the application data directory.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
        })
    }

    /// Loads the saved configuration, or defaults when none exists yet.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "configuration saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    tmp.set_extension(format!("json.{}", TMP_SUFFIX));
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_returns_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("currency", "eur").unwrap();
        config.set("delete_policy", "orphan").unwrap();
        config.set("utc_offset_minutes", "-300").unwrap();
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.currency, "EUR");
        assert_eq!(loaded.delete_policy, DeletePolicy::Orphan);
        assert_eq!(loaded.utc_offset_minutes, -300);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"currency":"GBP"}"#).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.currency, "GBP");
        assert_eq!(loaded.transaction_attempts, DEFAULT_TRANSACTION_ATTEMPTS);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("colour", "red"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(config.set("currency", "dollars").is_err());
        assert!(config.set("transaction_attempts", "0").is_err());
        assert!(config.set("utc_offset_minutes", "1000").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn entries_cover_every_key() {
        let keys: Vec<_> = Config::default()
            .entries()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, Config::KEYS.to_vec());
    }
}
