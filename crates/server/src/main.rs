//! pageweight MCP server entry point.
//!
//! Boots the analysis cache administration server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use pageweight_core::{AnalysisCacheService, AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let settings = config.cache_settings()?;
    let db = CacheDb::open(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to open cache database at {}", config.db_path.display()))?;

    tracing::info!(db_path = %config.db_path.display(), "Starting pageweight server on stdio transport");

    let cache = Arc::new(AnalysisCacheService::new(Arc::new(db), settings));
    let handler = handler::PageWeightServer::new(cache, config.cleanup_older_than_days);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
