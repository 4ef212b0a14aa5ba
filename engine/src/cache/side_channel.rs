use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

use super::Family;

/// A cached family payload and the time it was written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideEntry<T> {
    pub payload: T,
    pub timestamp: u64,
}

/// Per-family map of symbol -> latest payload with a fixed validity window.
///
/// Guarantees:
/// - `put` is unconditional last-write-wins.
/// - Expiry is evaluated only inside `get_if_valid`; an expired entry is
///   removed on that read and never comes back without a new `put`.
pub struct SideChannelCache<T> {
    family: Family,
    window_ms: u64,
    entries: Mutex<HashMap<String, SideEntry<T>>>,
}

impl<T: Clone> SideChannelCache<T> {
    pub fn new(family: Family) -> Self {
        Self::with_window(family, family.window_ms())
    }

    pub fn with_window(family: Family, window_ms: u64) -> Self {
        Self {
            family,
            window_ms,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Stores `payload` under `key`, returning the entry it replaced.
    pub fn put(&self, key: &str, payload: T, now_ms: u64) -> Option<SideEntry<T>> {
        let entry = SideEntry {
            payload,
            timestamp: now_ms,
        };
        let prev = self.entries.lock().insert(key.to_string(), entry);

        trace!(family = %self.family, key, replaced = prev.is_some(), "side entry written");
        prev
    }

    /// Returns the payload while `now - timestamp <= window`; otherwise the
    /// entry is deleted and `None` is returned.
    pub fn get_if_valid(&self, key: &str, now_ms: u64) -> Option<T> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;

        if now_ms.saturating_sub(entry.timestamp) <= self.window_ms {
            return Some(entry.payload.clone());
        }

        let age_ms = now_ms.saturating_sub(entry.timestamp);
        entries.remove(key);
        debug!(family = %self.family, key, age_ms, "expired side entry evicted");
        None
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of every stored entry, expired or not, sorted by key.
    pub fn entries(&self) -> Vec<(String, SideEntry<T>)> {
        let mut out: Vec<_> = self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Replaces the whole cache content.
    pub fn restore(&self, entries: Vec<(String, SideEntry<T>)>) {
        let mut map = self.entries.lock();
        map.clear();
        map.extend(entries);
    }
}
