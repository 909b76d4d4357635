//! shellcache server entry point.
//!
//! Boots one offline-caching worker, registers it (install + activate), and
//! exposes its events as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchConfig, HttpFetcher};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        version = %config.cache_version,
        db_path = %config.db_path.display(),
        "Starting shellcache worker on stdio transport"
    );

    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let host = host::WorkerHost::new(&config, cache, fetcher)?;

    if let Err(e) = host.worker.register().await {
        tracing::warn!(error = %e, "initial registration failed; call sw_install to retry");
    }

    let handler = handler::ShellCacheServer::new(host);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
