//! cache_cleanup tool implementation.
//!
//! Deletes cached analyses by age, by recorded expiration, or both.

use pageweight_core::{AnalysisCacheService, CleanupReport};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the cache_cleanup tool.
///
/// With neither field set, entries older than the configured default age are purged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheCleanupParams {
    /// Purge entries analyzed more than this many days ago.
    #[serde(default)]
    pub older_than_days: Option<u32>,

    /// Purge entries whose expiration has passed.
    #[serde(default)]
    pub expired: Option<bool>,
}

/// Output from the cache_cleanup tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheCleanupOutput {
    /// Total number of entries deleted.
    pub deleted: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than: Option<CleanupReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<CleanupReport>,
}

/// Implementation of the cache_cleanup tool.
pub async fn cleanup_impl(
    cache: &AnalysisCacheService, params: CacheCleanupParams, default_days: u32,
) -> Result<CallToolResult, McpError> {
    let expired = params.expired.unwrap_or(false);
    let older_than_days = match params.older_than_days {
        Some(0) => {
            return Err(ToolError::InvalidInput("older_than_days must be greater than 0".to_string()).into());
        }
        Some(days) => Some(days),
        None if !expired => Some(default_days),
        None => None,
    };

    let mut output = CacheCleanupOutput { deleted: 0, older_than: None, expired: None };

    if let Some(days) = older_than_days {
        let report = cache.cleanup_older_than(days).await;
        output.deleted += report.deleted;
        output.older_than = Some(report);
    }

    if expired {
        let report = cache.cleanup_expired().await;
        output.deleted += report.deleted;
        output.expired = Some(report);
    }

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cache::test_support::{make_result, parse_output, service};
    use chrono::{Duration, Utc};
    use pageweight_core::{AnalysisOptions, CleanupStatus};

    #[tokio::test]
    async fn test_cleanup_defaults_to_age() {
        let cache = service(true).await;
        let mut old = make_result("https://example.com", AnalysisOptions::default());
        old.timestamp = Utc::now() - Duration::days(45);
        cache.store(&old).await;
        cache.store(&make_result("https://example.com", AnalysisOptions::default())).await;

        let result = cleanup_impl(&cache, CacheCleanupParams::default(), 30).await.unwrap();
        let output: CacheCleanupOutput = parse_output(&result);
        assert_eq!(output.deleted, 1);
        assert_eq!(output.older_than.unwrap().status, CleanupStatus::Completed);
        assert!(output.expired.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_only() {
        let cache = service(true).await;
        let mut stale = make_result("https://example.com", AnalysisOptions::default());
        stale.timestamp = Utc::now() - Duration::hours(2);
        cache.store(&stale).await;
        cache.store(&make_result("https://example.org", AnalysisOptions::default())).await;

        let params = CacheCleanupParams { older_than_days: None, expired: Some(true) };
        let result = cleanup_impl(&cache, params, 30).await.unwrap();
        let output: CacheCleanupOutput = parse_output(&result);
        assert_eq!(output.deleted, 1);
        assert!(output.older_than.is_none());
        assert_eq!(cache.stats().await.total_analyses, 1);
    }

    #[tokio::test]
    async fn test_cleanup_disabled_cache() {
        let cache = service(false).await;
        let params = CacheCleanupParams { older_than_days: Some(7), expired: Some(true) };
        let result = cleanup_impl(&cache, params, 30).await.unwrap();
        let output: CacheCleanupOutput = parse_output(&result);
        assert_eq!(output.deleted, 0);
        assert_eq!(output.older_than.unwrap().status, CleanupStatus::Disabled);
        assert_eq!(output.expired.unwrap().status, CleanupStatus::Disabled);
    }

    #[tokio::test]
    async fn test_cleanup_accepts_max_days() {
        let cache = service(true).await;
        cache.store(&make_result("https://example.com", AnalysisOptions::default())).await;

        let params = CacheCleanupParams { older_than_days: Some(u32::MAX), expired: None };
        let result = cleanup_impl(&cache, params, 30).await.unwrap();
        let output: CacheCleanupOutput = parse_output(&result);
        assert_eq!(output.deleted, 0);
        assert_eq!(output.older_than.unwrap().status, CleanupStatus::Completed);
        assert_eq!(cache.stats().await.total_analyses, 1);
    }

    #[tokio::test]
    async fn test_cleanup_rejects_zero_days() {
        let cache = service(true).await;
        let params = CacheCleanupParams { older_than_days: Some(0), expired: None };
        let err = cleanup_impl(&cache, params, 30).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
