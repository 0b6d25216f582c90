mod config;
mod db;
mod errors;
mod history;
mod models;
mod routes;
mod session;
mod state;
mod tailoring;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::history::cache::ListCache;
use crate::history::client::HistoryClient;
use crate::history::memory::MemoryHistoryStore;
use crate::history::store::{HistoryStore, PgHistoryStore};
use crate::routes::build_router;
use crate::session::{PgSessionResolver, SessionResolver, StaticSessionResolver};
use crate::state::AppState;
use crate::tailoring::engine::{MockEngine, TailoringEngine};
use crate::tailoring::remote::RemoteEngine;
use crate::tailoring::single_flight::InflightRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // History store + session lookup share one backend
    let (store, sessions): (Arc<dyn HistoryStore>, Arc<dyn SessionResolver>) =
        match &config.database_url {
            Some(url) => {
                let db = create_pool(url).await?;
                (
                    Arc::new(PgHistoryStore::new(db.clone())),
                    Arc::new(PgSessionResolver::new(db)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; history is kept in memory and lost on restart");
                (
                    Arc::new(MemoryHistoryStore::new()),
                    Arc::new(StaticSessionResolver::new(config.session_tokens.clone())),
                )
            }
        };

    // Tailoring engine (MockEngine unless TAILOR_ENGINE_URL is set)
    let engine: Arc<dyn TailoringEngine> = match &config.engine_url {
        Some(url) => Arc::new(RemoteEngine::new(
            url.clone(),
            config.engine_api_key.clone(),
            config.engine_timeout,
        )?),
        None => Arc::new(MockEngine::new(config.mock_engine_latency)),
    };
    info!("Tailoring engine initialized (backend: {})", engine.backend());

    // Build app state
    let state = AppState {
        config: config.clone(),
        engine,
        inflight: Arc::new(InflightRegistry::new()),
        history: Arc::new(HistoryClient::with_cache(
            store,
            ListCache::new(config.history_cache_ttl, config.history_cache_max_entries),
        )),
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the web client has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
