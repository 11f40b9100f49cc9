//! Persistence for analysis results.
//!
//! [`ResultStore`] is the capability the cache service consumes. [`CacheDb`]
//! is the SQLite implementation, built on tokio-rusqlite with:
//!
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Integer nanosecond timestamps so stored instants round-trip and freshness
//!   comparisons are exact
//! - An append-only history per cache key

pub mod connection;
pub mod migrations;
pub mod results;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use crate::Error;
use crate::model::{AnalysisResult, CacheKey};

pub use connection::CacheDb;

/// Aggregate counts over everything the store holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_analyses: u64,
    pub unique_urls: u64,
}

/// Storage capability behind the analysis cache.
///
/// Time-dependent operations take `now` from the caller so that every
/// freshness decision is made against a single clock.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Freshest entry for `key` whose age at `now` is strictly below `ttl`.
    async fn find_valid(
        &self, key: &CacheKey, ttl: Duration, now: DateTime<Utc>,
    ) -> Result<Option<AnalysisResult>, Error>;

    /// Append `result`, recording an expiration of `result.timestamp + ttl`.
    async fn save(&self, result: &AnalysisResult, ttl: Duration) -> Result<(), Error>;

    async fn stats(&self) -> Result<StoreStats, Error>;

    /// Delete entries whose timestamp is before `cutoff`.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, Error>;

    /// Delete entries whose recorded expiration is at or before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Up to `limit` entries for `url` (any options), most recent first.
    async fn find_recent(&self, url: &str, limit: usize) -> Result<Vec<AnalysisResult>, Error>;

    /// Overwrite the recorded expiration of the freshest entry for `key`.
    ///
    /// Returns whether such an entry existed.
    async fn set_expiration(&self, key: &CacheKey, expires_at: DateTime<Utc>) -> Result<bool, Error>;
}
