//! Rental marketplace server backed by the in-memory store
//!
//! Configuration comes from the YAML file named by `RENTAL_CONFIG` (all
//! defaults when unset); `RENTAL_BIND` overrides the listen address and
//! `RUST_LOG` the log filter.

use anyhow::Result;
use rental::config::RentalConfig;
use rental::server::ServerBuilder;
use rental::storage::InMemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RentalConfig::load()?;
    tracing::info!(
        bind = %config.server.bind,
        timeout_ms = config.server.request_timeout_ms,
        "starting rental server"
    );

    ServerBuilder::new(config)
        .with_store(InMemoryStore::new())
        .serve()
        .await
}
