//! Configuration management for sitemapper
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! A missing config file is not an error: defaults apply until `sitemapper init`
//! writes one.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// User that owns snapshots when `--user-id` is not given
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    /// Report storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Source fetching configuration
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Report storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend name: "sqlite" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Override for the SQLite database file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_file: Option<PathBuf>,
}

/// Source fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Attempts per remote source before giving up
    #[serde(default = "default_fetch_max_attempts")]
    pub max_attempts: u32,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Linear backoff unit in milliseconds
    #[serde(default = "default_fetch_backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// User agent string
    #[serde(default = "default_fetch_user_agent")]
    pub user_agent: String,
}

/// Supported storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(Error::Config(format!("unsupported storage backend: {}", s))),
        }
    }
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for sitemapper data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            storage: StorageConfig::default(),
            fetch: FetchConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            db_file: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_fetch_max_attempts(),
            timeout_secs: default_fetch_timeout(),
            backoff_unit_ms: default_fetch_backoff_unit_ms(),
            user_agent: default_fetch_user_agent(),
        }
    }
}

impl StorageConfig {
    /// Resolve the configured backend
    pub fn backend(&self) -> Result<StorageBackend> {
        self.backend.parse()
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

impl Config {
    /// Get the default base directory for sitemapper (~/.sitemapper)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sitemapper")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            // Relative paths are taken from the config directory
            db_file: self
                .storage
                .db_file
                .as_ref()
                .map_or_else(|| base.join("sitemapper.db"), |p| base.join(p)),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path.
    ///
    /// Falls back to defaults (rooted next to `config_path`) when the file
    /// does not exist.
    pub fn load(config_path: &Path) -> Result<Self> {
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut config = if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            debug!("No config file at {:?}, using defaults", config_path);
            Config::default()
        };

        config.init_paths(Some(base));
        config.paths.config_file = config_path.to_path_buf();

        config.validate()?;
        Ok(config)
    }

    /// Build a default configuration rooted at `base_dir`
    pub fn with_base_dir(base_dir: Option<PathBuf>) -> Self {
        let mut config = Config::default();
        config.init_paths(base_dir);
        config
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_user_id.trim().is_empty() {
            return Err(Error::Config(
                "default_user_id must not be empty".to_string(),
            ));
        }

        self.storage.backend()?;

        if self.fetch.max_attempts == 0 {
            return Err(Error::Config(
                "fetch.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config(
                "fetch.timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
