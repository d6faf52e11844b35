//! Configuration service implementation.
//!
//! Loads the application configuration from `config.toml`, by default at
//! `~/.config/findyou/config.toml`. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use findyou_core::FindYouError;
use findyou_core::config::FindYouConfig;
use findyou_core::error::Result;

const APP_DIR: &str = "findyou";
const CONFIG_FILE: &str = "config.toml";

/// Resolves and loads the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses `path` when given, otherwise the platform config directory.
    pub fn new(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        Ok(Self { path })
    }

    /// `<config dir>/findyou/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| FindYouError::config("Cannot find the user config directory"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads, parses and validates the configuration.
    pub fn load(&self) -> Result<FindYouConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(FindYouConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: FindYouConfig = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %self.path.display(), "Loaded configuration");
        Ok(config)
    }
}
