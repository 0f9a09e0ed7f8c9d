//! folio-sw entry point.
//!
//! Boots the offline cache controller and hosts it as an MCP server on stdio
//! transport. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use folio_client::{FetchClient, FetchConfig};
use folio_core::{AppConfig, CacheDb};
use folio_worker::{Controller, Scope};
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
    let scope = Scope::from_config(&config)?;
    let cache = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;

    tracing::info!(
        origin = %scope.origin(),
        cache_name = scope.cache_name(),
        db_path = %config.db_path.display(),
        "Starting folio-sw on stdio transport"
    );

    let controller = Arc::new(Controller::new(scope, cache, Arc::new(network)));
    let handler = handler::FolioServer::new(controller);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
