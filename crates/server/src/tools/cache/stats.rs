//! cache_stats tool implementation.

use pageweight_core::AnalysisCacheService;
use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::json_result;

/// Implementation of the cache_stats tool.
pub async fn stats_impl(cache: &AnalysisCacheService) -> Result<CallToolResult, McpError> {
    json_result(&cache.stats().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cache::test_support::{make_result, parse_output, service};
    use pageweight_core::{AnalysisOptions, CacheStats};

    #[tokio::test]
    async fn test_stats_counts_entries() {
        let cache = service(true).await;
        cache.store(&make_result("https://example.com", AnalysisOptions::default())).await;
        cache.store(&make_result("https://example.org", AnalysisOptions::default())).await;

        let result = stats_impl(&cache).await.unwrap();
        let output: CacheStats = parse_output(&result);
        assert!(output.enabled);
        assert_eq!(output.ttl_hours, 1.0);
        assert_eq!(output.total_analyses, 2);
        assert_eq!(output.unique_urls, 2);
    }

    #[tokio::test]
    async fn test_stats_when_disabled() {
        let cache = service(false).await;
        let result = stats_impl(&cache).await.unwrap();
        let output: CacheStats = parse_output(&result);
        assert!(!output.enabled);
        assert_eq!(output.total_analyses, 0);
    }
}
