//! cache_recent tool implementation.
//!
//! Lists the most recent analyses of a URL across all options.

use pageweight_core::service::DEFAULT_RECENT_LIMIT;
use pageweight_core::{AnalysisCacheService, AnalysisResult};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, validate_url};

/// Upper bound on `limit` accepted from clients.
const MAX_RECENT_LIMIT: usize = 100;

/// Parameters for the cache_recent tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRecentParams {
    /// The analyzed page URL.
    pub url: String,

    /// Maximum number of analyses to return (default: 10, max: 100).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output from the cache_recent tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecentOutput {
    pub results: Vec<AnalysisResult>,
}

/// Implementation of the cache_recent tool.
pub async fn recent_impl(cache: &AnalysisCacheService, params: CacheRecentParams) -> Result<CallToolResult, McpError> {
    validate_url(&params.url)?;
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);

    let results = cache.recent_results(&params.url, limit).await;
    json_result(&CacheRecentOutput { results })
}
