//! Configuration validation rules.

use crate::config::CacheConfig;
use thiserror::Error;

/// Largest batch the sync endpoint is asked for.
const MAX_BATCH_SIZE: usize = 1_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl CacheConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `retention_days` or `search_limit` is 0
    /// - `default_source` is empty
    /// - `sync.base_url` is empty, or `sync.batch_size` is 0 or above 1000
    /// - `sync.timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_days == 0 {
            return Err(ConfigError::Invalid { field: "retention_days".into(), reason: "must be at least 1".into() });
        }

        if self.search_limit == 0 {
            return Err(ConfigError::Invalid { field: "search_limit".into(), reason: "must be greater than 0".into() });
        }

        if self.default_source.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "default_source".into(), reason: "must not be empty".into() });
        }

        if self.sync.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "sync.base_url".into(), reason: "must not be empty".into() });
        }

        if self.sync.batch_size == 0 || self.sync.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid {
                field: "sync.batch_size".into(),
                reason: format!("must be between 1 and {MAX_BATCH_SIZE}"),
            });
        }

        if self.sync.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "sync.timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.sync.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "sync.timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.retention_days > 3650 {
            tracing::warn!(retention_days = self.retention_days, "retention window exceeds ten years");
        }

        Ok(())
    }
}
