use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine settings for an OCR run. Every field has a default, so a missing
/// config file is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language code handed to the engine (e.g. "eng", "eng+hin").
    pub lang: String,
    /// Directory holding tessdata files; engine default when unset.
    pub tessdata_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { lang: "eng".to_string(), tessdata_path: None }
    }
}

impl AppConfig {
    /// Load from `path` when given, otherwise from the platform config
    /// directory. A missing file yields the defaults; malformed TOML is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "idlens", "Idlens")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
