//! Server configuration and shared application state

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::connections::ConnectionManager;
use crate::core::auth::IdentityProvider;
use crate::discovery::DiscoveryEngine;
use crate::feed::FeedAssembler;
use crate::graph::GraphResolver;
use crate::messaging::MessageManager;
use crate::posts::PostManager;
use crate::profiles::ProfileManager;
use crate::store::Store;

/// Configuration for the Circle server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite connection string
    pub database_url: String,
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    /// Handles starting with this prefix are system accounts, never discoverable
    pub system_account_prefix: String,
    /// Pool size
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:circle.sqlite".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            system_account_prefix: "guest_".to_string(),
            max_connections: 5,
        }
    }
}

impl ServerConfig {
    /// Build config from `CIRCLE_*` environment variables, keeping defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CIRCLE_DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = parse_env("CIRCLE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(prefix) = std::env::var("CIRCLE_SYSTEM_PREFIX") {
            config.system_account_prefix = prefix;
        }
        if let Some(n) = parse_env("CIRCLE_MAX_CONNECTIONS") {
            config.max_connections = n;
        }

        config
    }

    /// Config pointing at a database file inside `dir`
    pub fn with_database_dir(dir: impl AsRef<std::path::Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}", dir.as_ref().join("circle.sqlite").display()),
            ..Self::default()
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Store,
    pub identity: Arc<dyn IdentityProvider>,
    pub graph: Arc<GraphResolver>,
    pub feed: Arc<FeedAssembler>,
    pub connections: Arc<ConnectionManager>,
    pub discovery: Arc<DiscoveryEngine>,
    pub messages: Arc<MessageManager>,
    pub profiles: Arc<ProfileManager>,
    pub posts: Arc<PostManager>,
}

impl AppState {
    /// Wire every component on top of an opened store.
    pub fn new(config: ServerConfig, store: Store) -> Self {
        let graph = GraphResolver::new(store.clone());
        let feed = FeedAssembler::new(store.clone());

        Self {
            identity: Arc::new(store.clone()),
            connections: Arc::new(ConnectionManager::new(store.clone(), graph.clone())),
            discovery: Arc::new(DiscoveryEngine::new(
                store.clone(),
                graph.clone(),
                config.system_account_prefix.clone(),
            )),
            messages: Arc::new(MessageManager::new(store.clone(), graph.clone())),
            profiles: Arc::new(ProfileManager::new(store.clone(), graph.clone(), feed.clone())),
            posts: Arc::new(PostManager::new(store.clone())),
            feed: Arc::new(feed),
            graph: Arc::new(graph),
            store,
            config,
        }
    }
}
