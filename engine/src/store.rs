//! Alert store: the latest merged record per symbol plus bounded,
//! newest-first histories of merged records and raw inbound payloads.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::record::AlertRecord;

pub const HISTORY_CAP: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAlert {
    pub received_at: u64,
    pub payload: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub latest: BTreeMap<String, AlertRecord>,
    pub history: Vec<AlertRecord>,
    pub raw: Vec<RawAlert>,
}

pub struct AlertStore {
    cap: usize,
    latest: RwLock<HashMap<String, AlertRecord>>,
    history: Mutex<VecDeque<AlertRecord>>,
    raw: Mutex<VecDeque<RawAlert>>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAP)
    }
}

fn push_capped<T>(log: &mut VecDeque<T>, item: T, cap: usize) {
    log.push_front(item);
    log.truncate(cap);
}

impl AlertStore {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cap,
            latest: RwLock::new(HashMap::new()),
            history: Mutex::new(VecDeque::new()),
            raw: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record_raw(&self, payload: Map<String, Value>, now_ms: u64) {
        let raw = RawAlert {
            received_at: now_ms,
            payload,
        };
        push_capped(&mut self.raw.lock(), raw, self.cap);
    }

    /// Stores a fully merged record: prepended to history, replaces latest.
    pub fn record(&self, rec: AlertRecord) {
        push_capped(&mut self.history.lock(), rec.clone(), self.cap);
        self.latest.write().insert(rec.symbol.clone(), rec);
    }

    /// Applies `f` to the latest record for `symbol`, creating an empty one
    /// first if needed. History is left untouched.
    pub fn upsert_with<F>(&self, symbol: &str, now_ms: u64, f: F) -> AlertRecord
    where
        F: FnOnce(&mut AlertRecord),
    {
        let mut latest = self.latest.write();
        let rec = latest
            .entry(symbol.to_string())
            .or_insert_with(|| AlertRecord::empty(symbol, now_ms));
        f(rec);
        rec.updated_at = now_ms;
        rec.clone()
    }

    pub fn latest(&self, symbol: &str) -> Option<AlertRecord> {
        self.latest.read().get(symbol).cloned()
    }

    pub fn latest_price(&self, symbol: &str) -> Option<f64> {
        self.latest.read().get(symbol).and_then(|r| r.price)
    }

    /// One record per symbol, ordered by symbol.
    pub fn latest_per_symbol(&self) -> Vec<AlertRecord> {
        let mut out: Vec<_> = self.latest.read().values().cloned().collect();
        out.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        out
    }

    pub fn full_history(&self) -> Vec<AlertRecord> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn raw_history(&self) -> Vec<RawAlert> {
        self.raw.lock().iter().cloned().collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.latest.read().len()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let latest = self
            .latest
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        StoreSnapshot {
            latest,
            history: self.full_history(),
            raw: self.raw_history(),
        }
    }

    pub fn restore(&self, s: StoreSnapshot) {
        *self.latest.write() = s.latest.into_iter().collect();
        *self.history.lock() = s.history.into_iter().take(self.cap).collect();
        *self.raw.lock() = s.raw.into_iter().take(self.cap).collect();
    }
}
