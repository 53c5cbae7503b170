//! Application configuration, loaded from TOML

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use fourfall_core::AdversaryLevel;
use fourfall_net::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

const SAVE_FILE_NAME: &str = "saved_game.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Port the host listens on
    pub port: u16,
    /// Client connect timeout; 0 waits indefinitely
    pub connect_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    /// Save file location. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    /// Seconds between auto-saves of a running match; 0 disables
    pub auto_save_secs: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            path: None,
            auto_save_secs: 30,
        }
    }
}

impl SaveConfig {
    pub fn auto_save_interval(&self) -> Option<Duration> {
        (self.auto_save_secs > 0).then(|| Duration::from_secs(self.auto_save_secs))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdversaryConfig {
    pub level: AdversaryLevel,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub save: SaveConfig,
    pub adversary: AdversaryConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load `path`, or the defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.port == 0 {
            return Err(AppError::ConfigValidation(
                "network.port must be > 0".into(),
            ));
        }
        if self.network.connect_timeout_ms > 600_000 {
            return Err(AppError::ConfigValidation(
                "network.connect_timeout_ms must be <= 600000".into(),
            ));
        }
        if let Some(path) = &self.save.path {
            if path.as_os_str().is_empty() {
                return Err(AppError::ConfigValidation(
                    "save.path must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Save file path, falling back to the platform data directory
    pub fn save_path(&self) -> Result<PathBuf> {
        match &self.save.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(SAVE_FILE_NAME)),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "onyx", "fourfall").ok_or(AppError::NoDataDir)
}

fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Default config file location
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}
