//! Core types and shared functionality for pageweight.
//!
//! This crate provides:
//! - The analysis options model and result aggregate
//! - The `ResultStore` capability with a SQLite backend
//! - The analysis cache service (freshness, invalidation, failure isolation)
//! - Unified error types
//! - Configuration structures

pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, CacheSettings, ConfigError};
pub use error::Error;
pub use model::{AnalysisOptions, AnalysisResult, CacheKey, DeviceType, InteractionLevel};
pub use service::{AnalysisCacheService, CacheStats, CleanupReport, CleanupStatus};
pub use store::{CacheDb, ResultStore, StoreStats};
