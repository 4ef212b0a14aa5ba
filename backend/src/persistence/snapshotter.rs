//! Periodic engine snapshotting.
//!
//! The engine copies its state component by component, so a snapshot never
//! holds up ingestion for longer than one component copy. Failures are
//! logged and the engine keeps running on in-memory state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument};

use common::logger::warn_if_slow;
use common::time::now_ms;
use signal_engine::MergeEngine;

use crate::metrics::counters::{Counters, bump};
use crate::persistence::repository::SnapshotRepository;

const SLOW_SAVE: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct Snapshotter {
    engine: Arc<MergeEngine>,
    repo: Arc<dyn SnapshotRepository>,
    counters: Counters,
}

impl Snapshotter {
    pub fn new(
        engine: Arc<MergeEngine>,
        repo: Arc<dyn SnapshotRepository>,
        counters: Counters,
    ) -> Self {
        Self {
            engine,
            repo,
            counters,
        }
    }

    /// Loads the stored snapshot into the engine. Returns whether one existed.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> anyhow::Result<bool> {
        match self.repo.load_latest().await? {
            Some(snapshot) => {
                self.engine.restore(snapshot);
                Ok(true)
            }
            None => {
                info!("no stored snapshot; starting empty");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn save_now(&self) -> anyhow::Result<()> {
        let snapshot = self.engine.snapshot(now_ms());
        let symbols = snapshot.alerts.latest.len();

        let res = warn_if_slow("snapshot_save", SLOW_SAVE, self.repo.save(&snapshot)).await;
        match &res {
            Ok(()) => {
                bump(&self.counters.snapshots_saved);
                info!(symbols, "snapshot saved");
            }
            Err(_) => bump(&self.counters.snapshot_failures),
        }
        res
    }

    /// Runs forever, saving every `every`.
    pub async fn run(self, every: Duration) {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick fires immediately; nothing new to save yet
        ticker.tick().await;

        info!(every_secs = every.as_secs(), "snapshotter started");

        loop {
            ticker.tick().await;
            if let Err(e) = self.save_now().await {
                error!(error = ?e, "snapshot failed; continuing on in-memory state");
            }
        }
    }
}
