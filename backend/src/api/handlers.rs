use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{instrument, warn};

use common::time::now_ms;
use signal_engine::{AlertRecord, Payload, RawAlert};

use crate::error::AppError;
use crate::metrics::counters::CountersView;

use super::{ApiError, AppState};

/// Producers only ever see a 200: the body is queued when it parses as JSON
/// and kept as raw text under `raw` when it does not.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Value> {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(v) => Payload::from_value(v),
        Err(e) => {
            warn!(error = %e, "webhook body is not JSON");
            let mut map = Map::new();
            map.insert(
                "raw".to_string(),
                Value::String(String::from_utf8_lossy(&body).into_owned()),
            );
            Payload::new(map)
        }
    };

    if let Err(e) = state.ingest.submit(payload).await {
        warn!(error = %e, "update not queued");
    }

    Json(json!({ "status": "ok" }))
}

pub async fn latest_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertRecord>> {
    Json(state.engine.store().latest_per_symbol())
}

pub async fn alert_history(State(state): State<Arc<AppState>>) -> Json<Vec<AlertRecord>> {
    Json(state.engine.store().full_history())
}

pub async fn raw_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<RawAlert>> {
    Json(state.engine.store().raw_history())
}

pub async fn watchlist(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.watchlist().symbols())
}

#[derive(Debug, Serialize)]
pub struct StarResponse {
    pub symbol: String,
    pub starred: bool,
}

fn clean_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(AppError::InvalidSymbol(raw.to_string()));
    }
    Ok(symbol.to_string())
}

/// Stars in memory first; a persistence failure is logged and the star
/// stays effective until restart.
pub async fn star_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StarResponse>, ApiError> {
    let symbol = clean_symbol(&symbol)?;
    state.engine.watchlist().star(&symbol);

    if let Err(e) = state.watchlist_repo.star(&symbol, now_ms()).await {
        warn!(symbol = %symbol, error = ?e, "failed to persist star");
    }

    Ok(Json(StarResponse {
        symbol,
        starred: true,
    }))
}

pub async fn unstar_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StarResponse>, ApiError> {
    let symbol = clean_symbol(&symbol)?;
    state.engine.watchlist().unstar(&symbol);

    if let Err(e) = state.watchlist_repo.unstar(&symbol).await {
        warn!(symbol = %symbol, error = ?e, "failed to persist unstar");
    }

    Ok(Json(StarResponse {
        symbol,
        starred: false,
    }))
}

/// Live merge results as server-sent events. Lagging subscribers skip
/// the events they missed; every stream ends on shutdown.
pub async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut shutdown = state.shutdown.clone();
    let stop = async move {
        let _ = shutdown.wait_for(|stopping| *stopping).await;
    };

    let stream = BroadcastStream::new(state.broadcaster.subscribe())
        .filter_map(|ev| ev.ok())
        .map(|ev| Ok::<_, Infallible>(Event::default().event(ev.event).data(ev.data.to_string())));

    Sse::new(futures::StreamExt::take_until(stream, stop)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub symbols: usize,
    pub starred: usize,
    pub subscribers: usize,
    pub counters: CountersView,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        symbols: state.engine.store().symbol_count(),
        starred: state.engine.watchlist().symbols().len(),
        subscribers: state.broadcaster.subscriber_count(),
        counters: state.counters.view(),
    })
}
