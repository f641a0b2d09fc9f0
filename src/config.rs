use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CONFIG_TOML: &str = include_str!("config.toml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub clock: ClockConfig,
    pub storage: StorageConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub utc_offset_hours: i8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub db_file: String,
    pub identity_file: String,
    pub resource_dir: String,
}

/// Resolved on-disk locations, rooted at the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub identity_path: PathBuf,
    pub resource_dir: PathBuf,
}

impl StorageConfig {
    pub fn resolve(&self, data_dir: &Path) -> StoragePaths {
        StoragePaths {
            data_dir: data_dir.to_path_buf(),
            db_path: data_dir.join(&self.db_file),
            identity_path: data_dir.join(&self.identity_file),
            resource_dir: data_dir.join(&self.resource_dir),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    log_level: Option<String>,
    #[serde(default)]
    api: RawApiConfig,
    #[serde(default)]
    clock: RawClockConfig,
    #[serde(default)]
    storage: RawStorageConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApiConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClockConfig {
    utc_offset_hours: Option<i8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStorageConfig {
    db_file: Option<String>,
    identity_file: Option<String>,
    resource_dir: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "invalid config: {}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}

impl AppConfig {
    /// Built-in defaults, optionally overlaid by a user file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults: RawConfig = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let mut config = Self::from_raw(defaults, None)?;
        if let Some(path) = path {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            config = Self::from_raw(toml::from_str(&raw)?, Some(config))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let defaults = Self::load(None)?;
        let config = Self::from_raw(toml::from_str(raw)?, Some(defaults))?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig, base: Option<AppConfig>) -> Result<Self, ConfigError> {
        let missing = |field: &str| ConfigError::Invalid(format!("missing default for {field}"));
        let base_api = base.as_ref().map(|config| config.api.clone());
        let base_clock = base.as_ref().map(|config| config.clock);
        let base_storage = base.as_ref().map(|config| config.storage.clone());
        let base_level = base.as_ref().map(|config| config.log_level.clone());

        Ok(Self {
            api: ApiConfig {
                base_url: raw
                    .api
                    .base_url
                    .or_else(|| base_api.as_ref().map(|api| api.base_url.clone()))
                    .ok_or_else(|| missing("api.base_url"))?,
                timeout_secs: raw
                    .api
                    .timeout_secs
                    .or_else(|| base_api.as_ref().map(|api| api.timeout_secs))
                    .ok_or_else(|| missing("api.timeout_secs"))?,
            },
            clock: ClockConfig {
                utc_offset_hours: raw
                    .clock
                    .utc_offset_hours
                    .or_else(|| base_clock.map(|clock| clock.utc_offset_hours))
                    .ok_or_else(|| missing("clock.utc_offset_hours"))?,
            },
            storage: StorageConfig {
                db_file: raw
                    .storage
                    .db_file
                    .or_else(|| base_storage.as_ref().map(|s| s.db_file.clone()))
                    .ok_or_else(|| missing("storage.db_file"))?,
                identity_file: raw
                    .storage
                    .identity_file
                    .or_else(|| base_storage.as_ref().map(|s| s.identity_file.clone()))
                    .ok_or_else(|| missing("storage.identity_file"))?,
                resource_dir: raw
                    .storage
                    .resource_dir
                    .or_else(|| base_storage.as_ref().map(|s| s.resource_dir.clone()))
                    .ok_or_else(|| missing("storage.resource_dir"))?,
            },
            log_level: raw
                .log_level
                .or(base_level)
                .ok_or_else(|| missing("log_level"))?,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than zero".into(),
            ));
        }
        if !(-12..=14).contains(&self.clock.utc_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "clock.utc_offset_hours {} is outside -12..=14",
                self.clock.utc_offset_hours
            )));
        }
        Ok(())
    }
}
