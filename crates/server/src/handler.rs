//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{
    CacheCleanupParams, CacheLookupParams, CacheRecentParams, CacheSetExpirationParams, cleanup_impl, lookup_impl,
    recent_impl, set_expiration_impl, stats_impl,
};

use pageweight_core::AnalysisCacheService;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for pageweight.
#[derive(Clone)]
pub struct PageWeightServer {
    tool_router: ToolRouter<Self>,
    cache: Arc<AnalysisCacheService>,
    default_cleanup_days: u32,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PageWeightServer {
    /// Create a new server handler around a shared cache service.
    pub fn new(cache: Arc<AnalysisCacheService>, default_cleanup_days: u32) -> Self {
        Self { tool_router: Self::tool_router(), cache, default_cleanup_days }
    }

    #[tool(description = "Report whether the analysis cache is enabled, its TTL in hours, and how many analyses and distinct URLs are stored.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.cache).await
    }

    #[tool(description = "Look up a still-valid cached page weight analysis for a URL, interaction level and device type.")]
    async fn cache_lookup(&self, params: Parameters<CacheLookupParams>) -> Result<CallToolResult, McpError> {
        lookup_impl(&self.cache, params.0).await
    }

    #[tool(description = "List the most recent cached analyses of a URL across all options, newest first.")]
    async fn cache_recent(&self, params: Parameters<CacheRecentParams>) -> Result<CallToolResult, McpError> {
        recent_impl(&self.cache, params.0).await
    }

    #[tool(description = "Delete cached analyses older than a number of days and/or whose expiration has passed.")]
    async fn cache_cleanup(&self, params: Parameters<CacheCleanupParams>) -> Result<CallToolResult, McpError> {
        cleanup_impl(&self.cache, params.0, self.default_cleanup_days).await
    }

    #[tool(description = "Override the expiration of the newest cached analysis for a URL and options. Affects expired-entry cleanup only.")]
    async fn cache_set_expiration(
        &self, params: Parameters<CacheSetExpirationParams>,
    ) -> Result<CallToolResult, McpError> {
        set_expiration_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for PageWeightServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pageweight".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::cache::test_support::service;

    #[tokio::test]
    async fn test_all_cache_tools_are_routed() {
        let server = PageWeightServer::new(service(true).await, 30);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, ["cache_cleanup", "cache_lookup", "cache_recent", "cache_set_expiration", "cache_stats"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = PageWeightServer::new(service(false).await, 30);
        let info = server.get_info();
        assert_eq!(info.server_info.name, "pageweight");
        assert!(info.capabilities.tools.is_some());
    }
}
