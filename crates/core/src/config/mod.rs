//! Cache configuration with layered loading.
//!
//! Uses figment to merge, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if PANTRY_CONFIG_FILE set)
//! 3. Environment variables (PANTRY_*, nested keys split on `__`)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::eviction::DEFAULT_RETENTION_DAYS;
use crate::search::DEFAULT_SEARCH_LIMIT;

mod validation;

pub use validation::ConfigError;

/// Provenance tag stamped on records whose payload names no source.
pub const DEFAULT_ENRICHMENT_SOURCE: &str = "offline_cache";

/// Product cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite database file.
    ///
    /// Set via PANTRY_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Records not accessed for this many days are evicted by `clear_old_cache`.
    ///
    /// Set via PANTRY_RETENTION_DAYS environment variable.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Result cap used when a search passes no explicit limit.
    ///
    /// Set via PANTRY_SEARCH_LIMIT environment variable.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Enrichment source for payloads that carry none.
    ///
    /// Set via PANTRY_DEFAULT_SOURCE environment variable.
    #[serde(default = "default_source")]
    pub default_source: String,

    /// Remote popular-products source.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Settings for pulling popular products from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the product API.
    ///
    /// Set via PANTRY_SYNC__BASE_URL environment variable.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum number of products requested per sync.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for sync requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pantry-cache.sqlite")
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn default_source() -> String {
    DEFAULT_ENRICHMENT_SOURCE.into()
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}

fn default_batch_size() -> usize {
    100
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    "pantry/0.1".into()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            batch_size: default_batch_size(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl SyncConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            retention_days: default_retention_days(),
            search_limit: default_search_limit(),
            default_source: default_source(),
            sync: SyncConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PANTRY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PANTRY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
