use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::TimerMode;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_mode")]
    pub default_mode: TimerMode,
    #[serde(default = "default_countdown_minutes")]
    pub default_countdown_minutes: u32,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_mode: default_mode(),
            default_countdown_minutes: default_countdown_minutes(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions
fn default_database_path() -> String {
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_mode() -> TimerMode {
    TimerMode::Stopwatch
}

fn default_countdown_minutes() -> u32 {
    25
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config directory, creating it
    /// with defaults when missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        let exists = config_path.exists();
        let mut config = Self::load_from_path(&config_path)?;

        if !exists {
            // Fresh installs get a database under the profile's own data dir
            config.database_path = Self::default_database_path_for_profile(profile);
            if let Err(e) = config.save_to_path(&config_path) {
                log::error!("Failed to save config file {:?}: {}", config_path, e);
                return Err(e);
            }
        }

        Ok(config)
    }

    /// Load configuration from an explicit file. A missing file yields the
    /// defaults without writing anything.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;
        let config: Config = toml::from_str(&contents)?;
        if config.config_version != Some(CURRENT_CONFIG_VERSION) {
            log::warn!(
                "config {:?} has version {:?}, expected {}",
                path,
                config.config_version,
                CURRENT_CONFIG_VERSION
            );
        }
        Ok(config)
    }

    /// Save configuration to an explicit file
    pub fn save_to_path(&mut self, path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("deepwork.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/deepwork-dev/deepwork.db".to_string(),
                utils::Profile::Prod => "~/.local/share/deepwork/deepwork.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Countdown target in seconds
    pub fn default_countdown_seconds(&self) -> i64 {
        i64::from(self.default_countdown_minutes) * 60
    }
}
