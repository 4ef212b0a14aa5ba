//! Cached sector metadata.
//!
//! Lookups never block the merge: a miss or a stale entry is queued for an
//! out-of-band refresher, and the merge proceeds with whatever is cached.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use common::time::HOUR_MS;

pub const SECTOR_TTL_MS: u64 = 24 * HOUR_MS;

#[derive(Clone, Debug)]
struct SectorEntry {
    sector: Option<String>,
    fetched_at: u64,
}

pub struct SectorDirectory {
    ttl_ms: u64,
    entries: Mutex<HashMap<String, SectorEntry>>,
    pending: Mutex<BTreeSet<String>>,
}

impl Default for SectorDirectory {
    fn default() -> Self {
        Self::with_ttl(SECTOR_TTL_MS)
    }
}

impl SectorDirectory {
    pub fn with_ttl(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            entries: Mutex::new(HashMap::new()),
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    /// Cached sector for `symbol`. Stale entries are still returned while a
    /// refresh is queued.
    pub fn lookup(&self, symbol: &str, now_ms: u64) -> Option<String> {
        let cached = self.entries.lock().get(symbol).cloned();

        let fresh = cached
            .as_ref()
            .is_some_and(|e| now_ms.saturating_sub(e.fetched_at) <= self.ttl_ms);
        if !fresh && self.pending.lock().insert(symbol.to_string()) {
            debug!(symbol, "sector lookup queued");
        }

        cached.and_then(|e| e.sector)
    }

    /// Drains the refresh queue.
    pub fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock()).into_iter().collect()
    }

    /// Stores a lookup result. `None` means the provider knows no sector; it
    /// is cached too so unknown symbols are not re-queried every update.
    pub fn record(&self, symbol: &str, sector: Option<String>, now_ms: u64) {
        self.entries.lock().insert(
            symbol.to_string(),
            SectorEntry {
                sector,
                fetched_at: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
