//! cache_set_expiration tool implementation.
//!
//! Overrides the recorded expiration of the freshest analysis for a key.

use chrono::{DateTime, Utc};
use pageweight_core::AnalysisCacheService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, parse_options, validate_url};
use crate::error::ToolError;

/// Parameters for the cache_set_expiration tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSetExpirationParams {
    /// The analyzed page URL.
    pub url: String,

    /// "minimal", "default" (default) or "thorough".
    #[serde(default)]
    pub interaction_level: Option<String>,

    /// "desktop" (default) or "mobile".
    #[serde(default)]
    pub device_type: Option<String>,

    /// New expiration as an RFC 3339 timestamp.
    pub expires_at: String,
}

/// Output from the cache_set_expiration tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSetExpirationOutput {
    /// Whether an entry existed and was updated.
    pub updated: bool,
    pub expires_at: DateTime<Utc>,
}

/// Implementation of the cache_set_expiration tool.
pub async fn set_expiration_impl(
    cache: &AnalysisCacheService, params: CacheSetExpirationParams,
) -> Result<CallToolResult, McpError> {
    validate_url(&params.url)?;
    let options = parse_options(params.interaction_level.as_deref(), params.device_type.as_deref())?;
    let expires_at = DateTime::parse_from_rfc3339(&params.expires_at)
        .map_err(|e| ToolError::InvalidInput(format!("invalid expires_at '{}': {e}", params.expires_at)))?
        .with_timezone(&Utc);

    let updated = cache.set_expiration(&params.url, &options, expires_at).await;
    json_result(&CacheSetExpirationOutput { updated, expires_at })
}
