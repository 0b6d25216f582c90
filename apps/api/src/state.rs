use std::sync::Arc;

use crate::config::Config;
use crate::history::client::HistoryClient;
use crate::session::SessionResolver;
use crate::tailoring::engine::TailoringEngine;
use crate::tailoring::single_flight::InflightRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable engine. Default: MockEngine. Swap via TAILOR_ENGINE_URL.
    pub engine: Arc<dyn TailoringEngine>,
    pub inflight: Arc<InflightRegistry>,
    /// Owns the per-caller list cache; the only writer to it.
    pub history: Arc<HistoryClient>,
    pub sessions: Arc<dyn SessionResolver>,
}
