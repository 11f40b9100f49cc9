//! Cache-related MCP tools.
//!
//! Thin wrappers over [`AnalysisCacheService`](pageweight_core::AnalysisCacheService):
//! each tool validates raw input, calls one service operation and returns the
//! outcome as pretty-printed JSON.

pub mod cleanup;
pub mod expire;
pub mod lookup;
pub mod recent;
pub mod stats;

pub use cleanup::{CacheCleanupParams, cleanup_impl};
pub use expire::{CacheSetExpirationParams, set_expiration_impl};
pub use lookup::{CacheLookupParams, lookup_impl};
pub use recent::{CacheRecentParams, recent_impl};
pub use stats::stats_impl;

use pageweight_core::{AnalysisOptions, DeviceType, Error, InteractionLevel};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Build analysis options from raw tool input. Missing values use the defaults.
pub(crate) fn parse_options(interaction_level: Option<&str>, device_type: Option<&str>) -> Result<AnalysisOptions, Error> {
    let level = interaction_level.map(str::parse::<InteractionLevel>).transpose()?.unwrap_or_default();
    let device = device_type.map(str::parse::<DeviceType>).transpose()?.unwrap_or_default();
    Ok(AnalysisOptions::new(level, device))
}

/// Reject anything that is not an absolute URL. The string itself is used
/// unchanged as the cache key.
pub(crate) fn validate_url(url: &str) -> Result<(), ToolError> {
    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ToolError::InvalidInput(format!("invalid url '{url}': {e}")))
}

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::OutputFailed(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
