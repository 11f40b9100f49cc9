//! cache_lookup tool implementation.
//!
//! Returns the freshest valid analysis for a URL and options pair, if any.

use pageweight_core::{AnalysisCacheService, AnalysisResult};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, parse_options, validate_url};

/// Parameters for the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheLookupParams {
    /// The analyzed page URL, exactly as it was analyzed.
    pub url: String,

    /// "minimal", "default" (default) or "thorough".
    #[serde(default)]
    pub interaction_level: Option<String>,

    /// "desktop" (default) or "mobile".
    #[serde(default)]
    pub device_type: Option<String>,
}

/// Output from the cache_lookup tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheLookupOutput {
    pub hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

/// Implementation of the cache_lookup tool.
pub async fn lookup_impl(cache: &AnalysisCacheService, params: CacheLookupParams) -> Result<CallToolResult, McpError> {
    validate_url(&params.url)?;
    let options = parse_options(params.interaction_level.as_deref(), params.device_type.as_deref())?;

    let result = cache.lookup(&params.url, &options).await;
    json_result(&CacheLookupOutput { hit: result.is_some(), result })
}
