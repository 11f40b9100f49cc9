//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, MAX_TTL_HOURS, ttl_nanos};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

pub(crate) fn check_ttl_hours(ttl_hours: f64) -> Result<(), ConfigError> {
    if !ttl_hours.is_finite() || ttl_hours <= 0.0 {
        return Err(ConfigError::Invalid { field: "ttl_hours".into(), reason: "must be a positive number".into() });
    }
    if ttl_hours > MAX_TTL_HOURS {
        return Err(ConfigError::Invalid {
            field: "ttl_hours".into(),
            reason: format!("must not exceed {MAX_TTL_HOURS} hours (one year)"),
        });
    }
    if ttl_nanos(ttl_hours) == 0 {
        return Err(ConfigError::Invalid { field: "ttl_hours".into(), reason: "must be at least one nanosecond".into() });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `ttl_hours` is not a positive finite number or exceeds one year
    /// - `cleanup_older_than_days` is 0
    /// - `db_path` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ttl_hours(self.ttl_hours)?;

        if self.cleanup_older_than_days == 0 {
            return Err(ConfigError::Invalid {
                field: "cleanup_older_than_days".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set PAGEWEIGHT_DB_PATH environment variable".into(),
            });
        }

        if !self.cache_enabled {
            tracing::warn!(ttl_hours = self.ttl_hours, "Analysis cache is disabled; every request will re-run analysis");
        }

        Ok(())
    }
}
