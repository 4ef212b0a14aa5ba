use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

pub const BIG_TREND_LOW: f64 = 10.0;
pub const BIG_TREND_HIGH: f64 = 90.0;

/// Set at most once per symbol and local calendar day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigTrendDay {
    pub day: String,
    pub d1: f64,
    pub d2: f64,
    pub triggered_at: u64,
}

fn is_extreme(v: f64) -> bool {
    v < BIG_TREND_LOW || v > BIG_TREND_HIGH
}

/// Latest flag per symbol. A flag from an earlier day reads as unset.
#[derive(Default)]
pub struct BigTrendDays {
    flags: Mutex<BTreeMap<String, BigTrendDay>>,
}

impl BigTrendDays {
    /// Evaluates a dual-stochastic sample and returns today's flag, whether it
    /// was set just now or earlier today.
    pub fn evaluate(
        &self,
        symbol: &str,
        d1: f64,
        d2: f64,
        day: &str,
        now_ms: u64,
    ) -> Option<BigTrendDay> {
        let mut flags = self.flags.lock();

        if let Some(existing) = flags.get(symbol).filter(|f| f.day == day) {
            return Some(existing.clone());
        }

        if !(is_extreme(d1) || is_extreme(d2)) {
            return None;
        }

        let flag = BigTrendDay {
            day: day.to_string(),
            d1,
            d2,
            triggered_at: now_ms,
        };
        info!(symbol, day, d1, d2, "big trend day flagged");
        flags.insert(symbol.to_string(), flag.clone());
        Some(flag)
    }

    pub fn for_day(&self, symbol: &str, day: &str) -> Option<BigTrendDay> {
        self.flags
            .lock()
            .get(symbol)
            .filter(|f| f.day == day)
            .cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, BigTrendDay> {
        self.flags.lock().clone()
    }

    pub fn restore(&self, flags: BTreeMap<String, BigTrendDay>) {
        *self.flags.lock() = flags;
    }
}
