//! Analysis cache service.
//!
//! Decides whether a stored analysis can be reused, persists new analyses, and
//! runs cache administration. The cache is an optimization only: every store
//! failure is absorbed here and turned into a miss, a dropped write, an empty
//! list or a zero count, so a broken store never breaks an analysis request.
//!
//! ### Freshness
//! A stored result answers a lookup at time `now` iff its key matches and
//! `now - timestamp < ttl`. Reaching the TTL exactly counts as expired.
//! Expired rows may still occupy storage until one of the cleanup operations
//! removes them.
//!
//! ### Gating
//! With caching disabled, `lookup`, `store`, the cleanups, `recent_results`
//! and `set_expiration` are no-ops. `stats` still reports what the store holds.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheSettings;
use crate::model::{AnalysisOptions, AnalysisResult, CacheKey};
use crate::store::{ResultStore, StoreStats};

/// Default number of entries returned by [`AnalysisCacheService::recent_results`].
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Cache configuration merged with store-wide counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub ttl_hours: f64,
    pub total_analyses: u64,
    pub unique_urls: u64,
}

/// How a cleanup run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    /// The store ran the deletion.
    Completed,
    /// Caching is disabled; the store was not asked.
    Disabled,
    /// The store failed; nothing is known to have been deleted.
    Failed,
}

/// Outcome of a cleanup: the number of deleted entries and whether the
/// deletion actually ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub deleted: u64,
    pub status: CleanupStatus,
}

impl CleanupReport {
    fn completed(deleted: u64) -> Self {
        Self { deleted, status: CleanupStatus::Completed }
    }

    fn disabled() -> Self {
        Self { deleted: 0, status: CleanupStatus::Disabled }
    }

    fn failed() -> Self {
        Self { deleted: 0, status: CleanupStatus::Failed }
    }

    pub fn succeeded(&self) -> bool {
        self.status == CleanupStatus::Completed
    }
}

impl From<CleanupReport> for u64 {
    fn from(report: CleanupReport) -> Self {
        report.deleted
    }
}

/// Sole authority over reading, writing and expiring cached analyses.
///
/// Holds no mutable state of its own; share it behind an `Arc`.
pub struct AnalysisCacheService {
    store: Arc<dyn ResultStore>,
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AnalysisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCacheService").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl AnalysisCacheService {
    pub fn new(store: Arc<dyn ResultStore>, settings: CacheSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn ResultStore>, settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        tracing::info!(
            enabled = settings.enabled(),
            ttl_hours = settings.ttl_hours(),
            "Analysis cache service initialized"
        );
        Self { store, settings, clock }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled()
    }

    pub fn ttl_hours(&self) -> f64 {
        self.settings.ttl_hours()
    }

    /// Whether `result` may answer a lookup for `key` at `now`.
    fn is_valid_hit(&self, result: &AnalysisResult, key: &CacheKey, now: DateTime<Utc>) -> bool {
        result.cache_key() == *key && result.age_at(now) < self.settings.ttl()
    }

    /// Return the freshest valid result for `url` and `options`, if any.
    pub async fn lookup(&self, url: &str, options: &AnalysisOptions) -> Option<AnalysisResult> {
        if !self.is_enabled() {
            tracing::debug!(url, "Cache disabled, skipping cache lookup");
            return None;
        }

        let key = CacheKey::new(url, options);
        let now = self.clock.now();
        let started = Instant::now();
        let found = self.store.find_valid(&key, self.settings.ttl(), now).await;
        let lookup_ms = started.elapsed().as_millis() as u64;

        match found {
            Ok(Some(result)) if self.is_valid_hit(&result, &key, now) => {
                tracing::info!(
                    url,
                    cache_age_ms = result.age_at(now).num_milliseconds(),
                    lookup_ms,
                    "Cache hit - returning cached analysis"
                );
                Some(result)
            }
            Ok(Some(result)) => {
                tracing::warn!(
                    url,
                    stored_at = %result.timestamp,
                    "Store returned an entry outside the lookup key or TTL; treating as miss"
                );
                None
            }
            Ok(None) => {
                tracing::debug!(url, lookup_ms, "Cache miss - no valid cached analysis found");
                None
            }
            Err(error) => {
                tracing::error!(url, %error, "Error retrieving cached analysis");
                None
            }
        }
    }

    /// Persist `result`. Failures are logged and dropped.
    pub async fn store(&self, result: &AnalysisResult) {
        if !self.is_enabled() {
            tracing::debug!(url = %result.url, "Cache disabled, skipping cache save");
            return;
        }

        let started = Instant::now();
        match self.store.save(result, self.settings.ttl()).await {
            Ok(()) => tracing::info!(
                url = %result.url,
                duration_ms = result.duration,
                save_ms = started.elapsed().as_millis() as u64,
                resource_count = result.resources.resource_count,
                ttl_hours = self.settings.ttl_hours(),
                "Analysis result cached successfully"
            ),
            Err(error) => tracing::error!(url = %result.url, %error, "Error caching analysis result"),
        }
    }

    /// Configuration plus store-wide counts. Not gated by the enabled flag.
    ///
    /// Reports zero counts when the store cannot be read.
    pub async fn stats(&self) -> CacheStats {
        let counts = match self.store.stats().await {
            Ok(counts) => counts,
            Err(error) => {
                tracing::error!(%error, "Error reading cache statistics; reporting zero counts");
                StoreStats::default()
            }
        };

        CacheStats {
            enabled: self.is_enabled(),
            ttl_hours: self.ttl_hours(),
            total_analyses: counts.total_analyses,
            unique_urls: counts.unique_urls,
        }
    }

    /// Delete every entry analyzed more than `days` days ago.
    pub async fn cleanup_older_than(&self, days: u32) -> CleanupReport {
        if !self.is_enabled() {
            tracing::debug!("Cache disabled, skipping cleanup");
            return CleanupReport::disabled();
        }

        // A cutoff before the earliest representable instant matches nothing.
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::report_cleanup(self.store.delete_older_than(cutoff).await, "Cache cleanup", Some(days))
    }

    /// Delete every entry whose recorded expiration has passed.
    pub async fn cleanup_expired(&self) -> CleanupReport {
        if !self.is_enabled() {
            tracing::debug!("Cache disabled, skipping expired cache cleanup");
            return CleanupReport::disabled();
        }

        Self::report_cleanup(self.store.delete_expired(self.clock.now()).await, "Expired cache cleanup", None)
    }

    fn report_cleanup(outcome: Result<u64, Error>, operation: &'static str, older_than_days: Option<u32>) -> CleanupReport {
        match outcome {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::info!(deleted, ?older_than_days, "{operation} completed");
                }
                CleanupReport::completed(deleted)
            }
            Err(error) => {
                tracing::error!(%error, ?older_than_days, "{operation} failed");
                CleanupReport::failed()
            }
        }
    }

    /// Up to `limit` most recent analyses of `url` across all options.
    pub async fn recent_results(&self, url: &str, limit: usize) -> Vec<AnalysisResult> {
        if !self.is_enabled() {
            return Vec::new();
        }

        match self.store.find_recent(url, limit).await {
            Ok(results) => results,
            Err(error) => {
                tracing::error!(url, %error, "Error getting recent analyses");
                Vec::new()
            }
        }
    }

    /// Move the recorded expiration of the freshest entry for `url` and `options`.
    ///
    /// Only `cleanup_expired` reads the recorded expiration; lookups keep using
    /// the TTL. Returns whether an entry was updated.
    pub async fn set_expiration(&self, url: &str, options: &AnalysisOptions, expires_at: DateTime<Utc>) -> bool {
        if !self.is_enabled() {
            tracing::debug!(url, "Cache disabled, cannot set expiration");
            return false;
        }

        let key = CacheKey::new(url, options);
        match self.store.set_expiration(&key, expires_at).await {
            Ok(updated) => {
                tracing::info!(url, %expires_at, updated, "Custom cache expiration applied");
                updated
            }
            Err(error) => {
                tracing::error!(url, %error, "Error setting cache expiration");
                false
            }
        }
    }
}
