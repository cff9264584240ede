//! eikan-mcp server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use eikan_client::{FetchClient, FetchConfig};
use eikan_core::{AppConfig, CacheDb, View};

mod context;
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
    tracing::info!(version = %config.cache_version, origin = %config.origin, "Starting eikan server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let ctx = Arc::new(context::AppContext::new(config, db, network)?);

    if let Err(e) = ctx.controller.register().await {
        tracing::warn!(error = %e, "offline cache not updated, previous generation stays active");
    }

    if let View::Error { detail, .. } = ctx.reload().await {
        tracing::warn!(%detail, "catalog not loaded at startup");
    }

    let handler = handler::EikanServer::new(ctx);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
