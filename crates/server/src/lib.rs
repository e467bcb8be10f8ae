//! Circle Server Library
//!
//! Social-graph backend: profiles, posts, follow requests, a follow-filtered
//! feed, people discovery and messaging gated on connection status.

pub mod config;
pub mod connections;
pub mod core;
pub mod discovery;
pub mod feed;
pub mod graph;
pub mod handlers;
pub mod messaging;
pub mod models;
pub mod posts;
pub mod profiles;
pub mod router;
pub mod store;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AppState, ServerConfig};
use store::Store;

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Already set, ignore
    }

    info!("=== Circle Server ===");

    let config = ServerConfig::from_env();
    info!("Database: {}", config.database_url);
    info!("System account prefix: {:?}", config.system_account_prefix);

    let store = Store::connect(&config).await?;
    info!("Store initialized");

    let addr = config.bind_addr;
    let app = router::router(AppState::new(config, store));

    info!("Circle Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
