//! # Configuration Management Module
//!
//! Persistent application settings stored in platform-appropriate locations.
//! Handles loading, saving, and providing defaults for configuration options.
//!
//! ## Settings
//! - `port`: Serial port the sensor board is attached to
//! - `baud_rate`: Serial link speed
//! - `buffer_capacity`: Samples kept per channel for live display
//! - `export_dir`: Directory default export filenames are placed in
//!
//! ## Storage Location
//! - macOS: ~/Library/Application Support/ppg-scope/config.toml
//! - Linux: ~/.config/ppg-scope/config.toml
//! - Windows: %APPDATA%\ppg-scope\config.toml
//!
//! Command line flags override whatever is loaded here for a single run.

use crate::error::ConfigError;
use crate::visualization::BufferCapacity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

fn default_port() -> String {
    if cfg!(target_os = "windows") {
        "COM8".to_string()
    } else {
        "/dev/ttyACM0".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: String,
    pub baud_rate: u32,
    pub buffer_capacity: BufferCapacity,
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            buffer_capacity: BufferCapacity::default(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ppg-scope")
            .join("config.toml")
    }

    /// Load config from the default location, creating it if missing
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Load config from `path`, or write and return the default if it doesn't exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = toml::from_str(&contents).map_err(ConfigError::ParseFailed)?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save_to(path)?;
                log::info!("Created default config at {}", path.display());
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadFailed(e)),
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::config_path())
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml_string).map_err(ConfigError::WriteFailed)?;

        Ok(())
    }
}
