//! Application configuration management.
//!
//! Configuration is stored at `~/.config/reelcache/config.json`; every field
//! has a default so a missing file is not an error. Credentials and region
//! can be overridden from the environment:
//!
//! - `REELCACHE_API_KEY`
//! - `REELCACHE_ACCESS_TOKEN`
//! - `REELCACHE_REGION`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "reelcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Region used for watch providers when none is configured
pub const DEFAULT_REGION: &str = "US";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode config for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub image_base_url: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub language: String,
    pub region: Option<String>,
    pub memory_cache_entries: usize,
    pub memory_cache_bytes: usize,
    pub max_concurrent_downloads: usize,
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/".to_string(),
            api_key: None,
            access_token: None,
            language: "en-US".to_string(),
            region: None,
            memory_cache_entries: 200,
            memory_cache_bytes: 64 * 1024 * 1024,
            max_concurrent_downloads: 6,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Load from the config file (if any), then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_saved()?;
        config.apply_env(|key| std::env::var(key).ok());
        debug!(region = ?config.region, has_key = config.api_key.is_some(), "Config loaded");
        Ok(config)
    }

    /// Only what is in the config file, without environment overrides.
    pub fn load_saved() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to the config file, creating its directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoDirectory("config"))?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("REELCACHE_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(token) = non_empty("REELCACHE_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(region) = non_empty("REELCACHE_REGION") {
            self.region = Some(region.to_ascii_uppercase());
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Region code for watch providers.
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::NoDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn catalog_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.cache_dir()?.join("catalog"))
    }

    pub fn images_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.cache_dir()?.join("images"))
    }
}
