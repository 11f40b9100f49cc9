//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGEWEIGHT_*)
//! 2. TOML config file (if PAGEWEIGHT_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Configuration is read once at startup. The cache service receives an
//! immutable [`CacheSettings`] value and never looks at the environment again.

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Upper bound for `ttl_hours` (one year).
pub const MAX_TTL_HOURS: f64 = 8760.0;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGEWEIGHT_*)
/// 2. TOML config file (if PAGEWEIGHT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Whether analysis results are cached at all.
    ///
    /// Set via PAGEWEIGHT_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// How long a stored analysis stays valid, in hours.
    ///
    /// Set via PAGEWEIGHT_TTL_HOURS environment variable.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: f64,

    /// Path to SQLite cache database.
    ///
    /// Set via PAGEWEIGHT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Age threshold used by `cache_cleanup` when the caller gives none.
    ///
    /// Set via PAGEWEIGHT_CLEANUP_OLDER_THAN_DAYS environment variable.
    #[serde(default = "default_cleanup_days")]
    pub cleanup_older_than_days: u32,
}

fn default_true() -> bool {
    true
}

fn default_ttl_hours() -> f64 {
    24.0
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pageweight-cache.sqlite")
}

fn default_cleanup_days() -> u32 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            ttl_hours: default_ttl_hours(),
            db_path: default_db_path(),
            cleanup_older_than_days: default_cleanup_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack `load` extracts from.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGEWEIGHT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("PAGEWEIGHT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The immutable settings the cache service is constructed with.
    pub fn cache_settings(&self) -> Result<CacheSettings, ConfigError> {
        CacheSettings::new(self.cache_enabled, self.ttl_hours)
    }
}

const NANOS_PER_HOUR: f64 = 3_600_000_000_000.0;

fn ttl_nanos(ttl_hours: f64) -> i64 {
    (ttl_hours * NANOS_PER_HOUR).round() as i64
}

/// Cache policy fixed for the lifetime of a service instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    enabled: bool,
    ttl_hours: f64,
}

impl CacheSettings {
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless `ttl_hours` is finite, positive and
    /// at most [`MAX_TTL_HOURS`].
    pub fn new(enabled: bool, ttl_hours: f64) -> Result<Self, ConfigError> {
        validation::check_ttl_hours(ttl_hours)?;
        Ok(Self { enabled, ttl_hours })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn ttl_hours(&self) -> f64 {
        self.ttl_hours
    }

    /// TTL at nanosecond resolution. Never zero for a validated value.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::nanoseconds(ttl_nanos(self.ttl_hours))
    }
}
