//! Config management use case

use crate::domain::FilenameScheme;
use crate::error::{JotterError, Result};
use crate::infrastructure::{Config, ConfigStore};
use crate::logging::normalize_level;
use std::str::FromStr;

const VALID_KEYS: &str = "storage_path, filename_scheme, log_level";

/// Service for reading and changing persisted settings
pub struct ConfigService {
    settings: ConfigStore,
}

impl ConfigService {
    pub fn new(settings: ConfigStore) -> Self {
        ConfigService { settings }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.settings.load()?;

        match key {
            "storage_path" => Ok(config.storage_path.display().to_string()),
            "filename_scheme" => Ok(config.filename_scheme.to_string()),
            "log_level" => Ok(config.log_level),
            _ => Err(JotterError::Config(format!(
                "Unknown config key: '{}'. Valid keys are: {}",
                key, VALID_KEYS
            ))),
        }
    }

    /// Set a config value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.settings.load()?;

        match key {
            "filename_scheme" => {
                config.filename_scheme =
                    FilenameScheme::from_str(value).map_err(JotterError::Config)?;
            }
            "log_level" => {
                config.log_level = normalize_level(value)
                    .map_err(JotterError::Config)?
                    .to_string();
            }
            "storage_path" => {
                return Err(JotterError::Config(
                    "storage_path cannot be set directly; entries would be left behind"
                        .to_string(),
                ));
            }
            _ => {
                return Err(JotterError::Config(format!(
                    "Unknown config key: '{}'. Valid keys are: {}",
                    key, VALID_KEYS
                )));
            }
        }

        self.settings.save(&config)
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.settings.load()
    }
}
