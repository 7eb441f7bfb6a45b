//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/bookshelf/config.toml)
//! 3. Environment variables (SHELF_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::query::DEFAULT_PAGE_SIZE;
use crate::seed::SeedSource;
use crate::storage::STORAGE_KEY;

/// Environment variable prefix
const ENV_PREFIX: &str = "SHELF";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the stored record array
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote JSON seed resource (optional)
    #[serde(default)]
    pub seed_url: Option<String>,

    /// Local JSON seed file, used when no URL is set
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Rows per page for listings
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Log destination when SHELF_LOG is set (default: {data_dir}/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed_url: None,
            seed_file: None,
            page_size: default_page_size(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SHELF_DATA_DIR, SHELF_SEED_URL, SHELF_SEED_FILE, SHELF_PAGE_SIZE)
    /// 2. Config file (~/.config/bookshelf/config.toml or SHELF_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.normalize();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // SHELF_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // SHELF_SEED_URL
        if let Ok(val) = std::env::var(format!("{}_SEED_URL", ENV_PREFIX)) {
            self.seed_url = if val.is_empty() { None } else { Some(val) };
        }

        // SHELF_SEED_FILE
        if let Ok(val) = std::env::var(format!("{}_SEED_FILE", ENV_PREFIX)) {
            self.seed_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        // SHELF_PAGE_SIZE
        if let Ok(val) = std::env::var(format!("{}_PAGE_SIZE", ENV_PREFIX)) {
            match val.parse() {
                Ok(size) => self.page_size = size,
                Err(_) => warn!("Ignoring invalid {}_PAGE_SIZE: {:?}", ENV_PREFIX, val),
            }
        }
    }

    /// Replace values that cannot be used
    fn normalize(&mut self) {
        if self.page_size == 0 {
            warn!("page_size must be positive, using {}", DEFAULT_PAGE_SIZE);
            self.page_size = DEFAULT_PAGE_SIZE;
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SHELF_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookshelf")
            .join("config.toml")
    }

    /// Where the seed set comes from: URL, then file, then the built-in list
    pub fn seed_source(&self) -> SeedSource {
        if let Some(url) = &self.seed_url {
            SeedSource::Url(url.clone())
        } else if let Some(path) = &self.seed_file {
            SeedSource::File(path.clone())
        } else {
            SeedSource::Builtin
        }
    }

    /// Get the path to the stored record array
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", STORAGE_KEY))
    }

    /// Get the path to the debug log
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bookshelf")
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
