//! HTTP surface: webhook ingress, dashboard JSON, watch list, live events.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::*;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::sync::watch;

use signal_engine::MergeEngine;

use crate::broadcast::Broadcaster;
use crate::ingest::IngestHandle;
use crate::metrics::counters::Counters;
use crate::persistence::WatchlistRepository;

pub struct AppState {
    pub engine: Arc<MergeEngine>,
    pub ingest: IngestHandle,
    pub watchlist_repo: Arc<dyn WatchlistRepository>,
    pub broadcaster: Broadcaster,
    pub counters: Counters,
    /// Flips to `true` on shutdown so long-lived SSE streams end.
    pub shutdown: watch::Receiver<bool>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::webhook))
        .route("/alerts", get(handlers::latest_alerts))
        .route("/alerts/history", get(handlers::alert_history))
        .route("/alerts/raw", get(handlers::raw_alerts))
        .route("/watchlist", get(handlers::watchlist))
        .route(
            "/watchlist/{symbol}",
            put(handlers::star_symbol).delete(handlers::unstar_symbol),
        )
        .route("/events", get(handlers::events))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
}
