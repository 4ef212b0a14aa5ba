use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub ingested: Arc<AtomicU64>,
    pub ignored: Arc<AtomicU64>,

    pub notifications: Arc<AtomicU64>,
    pub notify_failures: Arc<AtomicU64>,

    pub snapshots_saved: Arc<AtomicU64>,
    pub snapshot_failures: Arc<AtomicU64>,

    pub sector_lookups: Arc<AtomicU64>,
    pub sector_failures: Arc<AtomicU64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountersView {
    pub ingested: u64,
    pub ignored: u64,
    pub notifications: u64,
    pub notify_failures: u64,
    pub snapshots_saved: u64,
    pub snapshot_failures: u64,
    pub sector_lookups: u64,
    pub sector_failures: u64,
}

pub fn bump(c: &AtomicU64) {
    c.fetch_add(1, Ordering::Relaxed);
}

fn get(c: &AtomicU64) -> u64 {
    c.load(Ordering::Relaxed)
}

impl Counters {
    pub fn view(&self) -> CountersView {
        CountersView {
            ingested: get(&self.ingested),
            ignored: get(&self.ignored),
            notifications: get(&self.notifications),
            notify_failures: get(&self.notify_failures),
            snapshots_saved: get(&self.snapshots_saved),
            snapshot_failures: get(&self.snapshot_failures),
            sector_lookups: get(&self.sector_lookups),
            sector_failures: get(&self.sector_failures),
        }
    }
}
