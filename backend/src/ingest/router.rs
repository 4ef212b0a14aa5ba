//! Per-symbol ingest routing.
//!
//! Guarantees:
//! - FIFO processing per symbol
//! - concurrency across symbols
//! - bounded memory via per-symbol channel capacity
//!
//! Updates without a usable symbol carry no ordering requirement and are
//! processed inline by the router so they still reach raw history.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};

use signal_engine::Payload;

use crate::error::AppError;
use crate::ingest::pipeline::IngestPipeline;

/// Cloneable entry point used by the HTTP layer.
#[derive(Clone)]
pub struct IngestHandle {
    tx: Sender<Payload>,
}

impl IngestHandle {
    /// Waits for queue space; fails only once the router has shut down.
    pub async fn submit(&self, payload: Payload) -> Result<(), AppError> {
        self.tx.send(payload).await.map_err(|_| AppError::IngestClosed)
    }
}

pub struct IngestRouter {
    pipeline: IngestPipeline,

    /// Maximum backlog per symbol.
    per_symbol_capacity: usize,

    /// Active worker channels keyed by symbol.
    symbol_txs: Mutex<HashMap<String, Sender<Payload>>>,
    workers: Mutex<JoinSet<()>>,
}

impl IngestRouter {
    pub fn new(pipeline: IngestPipeline, per_symbol_capacity: usize) -> Self {
        Self {
            pipeline,
            per_symbol_capacity: per_symbol_capacity.max(1),
            symbol_txs: Mutex::new(HashMap::new()),
            workers: Mutex::new(JoinSet::new()),
        }
    }

    /// Creates the inbound channel. Run the router with the receiver.
    pub fn channel(capacity: usize) -> (IngestHandle, Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (IngestHandle { tx }, rx)
    }

    /// Main router loop. Returns once every handle is dropped and all
    /// per-symbol workers have drained their queues.
    pub async fn run(self: Arc<Self>, mut rx: Receiver<Payload>) {
        info!(component = "router", event = "startup", "ingest router started");

        while let Some(payload) = rx.recv().await {
            let Some(symbol) = payload.symbol().ok().map(str::to_string) else {
                self.pipeline.process(payload);
                continue;
            };

            let tx = self.get_or_spawn_worker(&symbol).await;
            let payload = match tx.try_send(payload) {
                Ok(()) => continue,
                Err(TrySendError::Full(payload)) => {
                    // Backpressure: every other symbol waits behind this one.
                    warn!(
                        component = "router",
                        %symbol,
                        capacity = self.per_symbol_capacity,
                        "per-symbol queue full; waiting for worker"
                    );
                    match tx.send(payload).await {
                        Ok(()) => continue,
                        Err(mpsc::error::SendError(payload)) => payload,
                    }
                }
                Err(TrySendError::Closed(payload)) => payload,
            };

            // Worker died; purge and retry once on a fresh worker.
            warn!(component = "router", %symbol, "worker channel closed; respawning");
            self.symbol_txs.lock().await.remove(&symbol);
            let tx = self.get_or_spawn_worker(&symbol).await;
            if tx.send(payload).await.is_err() {
                warn!(component = "router", %symbol, "update dropped");
            }
        }

        info!(component = "router", event = "draining", "ingest channel closed");
        self.symbol_txs.lock().await.clear();

        let mut workers = std::mem::take(&mut *self.workers.lock().await);
        while workers.join_next().await.is_some() {}

        info!(component = "router", event = "shutdown", "ingest router stopped");
    }

    /// Returns the sender for `symbol`, spawning its worker on first use.
    async fn get_or_spawn_worker(&self, symbol: &str) -> Sender<Payload> {
        let mut txs = self.symbol_txs.lock().await;
        if let Some(tx) = txs.get(symbol) {
            return tx.clone();
        }

        let (tx, rx) = mpsc::channel(self.per_symbol_capacity);
        let worker = SymbolWorker {
            pipeline: self.pipeline.clone(),
            symbol: symbol.to_string(),
        };
        self.workers.lock().await.spawn(worker.run(rx));
        txs.insert(symbol.to_string(), tx.clone());

        debug!(component = "router", %symbol, "spawned symbol worker");
        tx
    }
}

/// Processes one symbol's updates sequentially.
struct SymbolWorker {
    pipeline: IngestPipeline,
    symbol: String,
}

impl SymbolWorker {
    async fn run(self, mut rx: Receiver<Payload>) {
        let span = info_span!("symbol_worker", symbol = %self.symbol);

        async move {
            while let Some(payload) = rx.recv().await {
                let outcome = self.pipeline.process(payload);
                debug!(kind = %outcome.kind, "update merged");
            }
        }
        .instrument(span)
        .await;
    }
}
