//! Configuration management

use crate::domain::FilenameScheme;
use crate::error::{JotterError, Result};
use crate::infrastructure::file_store::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the application home (config file and default storage root)
pub const HOME_ENV: &str = "JOTTER_HOME";

const CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "jotter";
const ENTRIES_DIR: &str = "entries";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one file per entry
    #[serde(default = "Config::default_storage_path")]
    pub storage_path: PathBuf,
    #[serde(default)]
    pub filename_scheme: FilenameScheme,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: Self::default_storage_path(),
            filename_scheme: FilenameScheme::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Storage root used until the user relocates the journal
    pub fn default_storage_path() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return PathBuf::from(home).join(ENTRIES_DIR);
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join(APP_DIR).join(ENTRIES_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR).join(ENTRIES_DIR))
    }

    /// Directory holding config.toml, checking JOTTER_HOME first
    pub fn default_config_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return Ok(PathBuf::from(home));
        }
        dirs::config_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| {
                JotterError::Config(format!(
                    "Cannot determine a config directory. Set {} to choose one.",
                    HOME_ENV
                ))
            })
    }

    /// Load config from config.toml in the given directory; defaults if absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);

        let contents = match fs::read_to_string(&config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(JotterError::Io(e)),
        };

        toml::from_str(&contents)
            .map_err(|e| JotterError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to config.toml in the given directory
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| JotterError::Config(format!("Failed to serialize config: {}", e)))?;

        write_atomic(&dir.join(CONFIG_FILE), contents.as_bytes())
    }
}

/// Where the configuration lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: PathBuf) -> Self {
        ConfigStore { dir }
    }

    /// Config store at the platform default location (or JOTTER_HOME)
    pub fn discover() -> Result<Self> {
        Ok(ConfigStore::new(Config::default_config_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&self) -> Result<Config> {
        Config::load_from_dir(&self.dir)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filename_scheme, FilenameScheme::Id);
        assert_eq!(config.log_level, "warn");
        assert!(config.storage_path.ends_with("entries"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            storage_path: temp.path().join("journal"),
            filename_scheme: FilenameScheme::Title,
            log_level: "debug".to_string(),
        };

        config.save_to_dir(temp.path()).unwrap();
        assert!(temp.path().join("config.toml").exists());

        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded.filename_scheme, FilenameScheme::Id);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("config.toml"),
            "storage_path = \"/tmp/somewhere\"\n",
        )
        .unwrap();

        let loaded = Config::load_from_dir(temp.path()).unwrap();
        assert_eq!(loaded.storage_path, PathBuf::from("/tmp/somewhere"));
        assert_eq!(loaded.filename_scheme, FilenameScheme::Id);
        assert_eq!(loaded.log_level, "warn");
    }

    #[test]
    fn test_load_invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("config.toml"), "filename_scheme = 3").unwrap();

        match Config::load_from_dir(temp.path()) {
            Err(JotterError::Config(msg)) => assert!(msg.contains("config.toml")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("nested"));
        let mut config = Config::default();
        config.storage_path = temp.path().join("entries");

        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }
}
