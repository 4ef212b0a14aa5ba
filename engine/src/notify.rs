//! Edge-triggered trend notifications.
//!
//! Two triggers share one per-symbol "previous trend":
//! * the global extreme trigger watches the quad-stochastic slow line for
//!   every symbol and fires once on entering the `< 20` / `> 80` zone;
//! * the watch-list trigger fires on any trend change of a starred symbol,
//!   except for the very first observation.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::record::{AlertRecord, TrendLabel};

pub const EXTREME_LOW: f64 = 20.0;
pub const EXTREME_HIGH: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationTrigger {
    Extreme,
    TrendChange,
}

impl fmt::Display for NotificationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationTrigger::Extreme => write!(f, "extreme"),
            NotificationTrigger::TrendChange => write!(f, "trend_change"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendNotification {
    pub symbol: String,
    pub old_trend: Option<TrendLabel>,
    pub new_trend: TrendLabel,
    pub price: Option<f64>,
    /// Oscillator value that drove the decision.
    pub value: f64,
    pub trigger: NotificationTrigger,
    pub at: u64,
}

fn extreme_label(value: f64) -> Option<TrendLabel> {
    if value < EXTREME_LOW {
        Some(TrendLabel::VeryShort)
    } else if value > EXTREME_HIGH {
        Some(TrendLabel::VeryLong)
    } else {
        None
    }
}

#[derive(Default)]
pub struct EdgeDetector {
    previous: Mutex<BTreeMap<String, TrendLabel>>,
}

impl EdgeDetector {
    /// Compares a freshly classified record against the stored trend and
    /// decides whether to notify. State is updated regardless of delivery.
    pub fn observe(
        &self,
        rec: &AlertRecord,
        starred: bool,
        now_ms: u64,
    ) -> Option<TrendNotification> {
        let mut previous = self.previous.lock();
        let symbol = rec.symbol.as_str();

        if let Some((value, label)) = rec
            .extreme_value()
            .and_then(|v| extreme_label(v).map(|l| (v, l)))
        {
            let old = previous.get(symbol).cloned();
            if old.as_ref() == Some(&label) {
                // Still inside the zone; the watch-list path stays quiet too.
                return None;
            }

            info!(symbol, value, new_trend = %label, "extreme zone entered");
            previous.insert(symbol.to_string(), label.clone());
            return Some(TrendNotification {
                symbol: symbol.to_string(),
                old_trend: old,
                new_trend: label,
                price: rec.price,
                value,
                trigger: NotificationTrigger::Extreme,
                at: now_ms,
            });
        }

        let new_trend = rec.calculated_trend.clone();
        let old = previous.insert(symbol.to_string(), new_trend.clone());

        let old = match old {
            Some(old) if old != new_trend => old,
            _ => return None,
        };

        if !starred {
            debug!(symbol, old_trend = %old, new_trend = %new_trend, "trend changed (not starred)");
            return None;
        }

        info!(symbol, old_trend = %old, new_trend = %new_trend, "trend changed");
        Some(TrendNotification {
            symbol: symbol.to_string(),
            old_trend: Some(old),
            new_trend,
            price: rec.price,
            value: rec.slow_value(),
            trigger: NotificationTrigger::TrendChange,
            at: now_ms,
        })
    }

    pub fn previous(&self, symbol: &str) -> Option<TrendLabel> {
        self.previous.lock().get(symbol).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, TrendLabel> {
        self.previous.lock().clone()
    }

    pub fn restore(&self, trends: BTreeMap<String, TrendLabel>) {
        *self.previous.lock() = trends;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Direction, QuadSignal};

    fn record(symbol: &str, trend: TrendLabel) -> AlertRecord {
        let mut rec = AlertRecord::empty(symbol, 0);
        rec.calculated_trend = trend;
        rec.price = Some(101.5);
        rec
    }

    fn with_quad(mut rec: AlertRecord, d2: f64) -> AlertRecord {
        rec.quad = Some(QuadSignal {
            signal: None,
            d1: 50.0,
            d2,
            d1_direction: Direction::Flat,
            d2_direction: Direction::Flat,
        });
        rec
    }

    #[test]
    fn first_observation_is_silent() {
        let edges = EdgeDetector::default();
        assert!(edges.observe(&record("AAPL", TrendLabel::TryLong), true, 1).is_none());
        assert_eq!(edges.previous("AAPL"), Some(TrendLabel::TryLong));
    }

    #[test]
    fn starred_trend_change_notifies_once() {
        let edges = EdgeDetector::default();
        edges.observe(&record("AAPL", TrendLabel::TryLong), true, 1);

        let n = edges
            .observe(&record("AAPL", TrendLabel::DeadLong), true, 2)
            .unwrap();
        assert_eq!(n.old_trend, Some(TrendLabel::TryLong));
        assert_eq!(n.new_trend, TrendLabel::DeadLong);
        assert_eq!(n.trigger, NotificationTrigger::TrendChange);
        assert_eq!(n.price, Some(101.5));

        assert!(edges.observe(&record("AAPL", TrendLabel::DeadLong), true, 3).is_none());
    }

    #[test]
    fn unstarred_symbols_are_tracked_but_silent() {
        let edges = EdgeDetector::default();
        edges.observe(&record("MSFT", TrendLabel::TryLong), false, 1);
        assert!(edges.observe(&record("MSFT", TrendLabel::TryShort), false, 2).is_none());
        assert_eq!(edges.previous("MSFT"), Some(TrendLabel::TryShort));
    }

    #[test]
    fn extreme_trigger_fires_for_any_symbol_once() {
        let edges = EdgeDetector::default();
        let rec = with_quad(record("TSLA", TrendLabel::Neutral), 15.0);

        let n = edges.observe(&rec, false, 1).unwrap();
        assert_eq!(n.trigger, NotificationTrigger::Extreme);
        assert_eq!(n.new_trend, TrendLabel::VeryShort);
        assert_eq!(n.value, 15.0);

        let still_low = with_quad(record("TSLA", TrendLabel::TryShort), 12.0);
        assert!(edges.observe(&still_low, true, 2).is_none());
        assert_eq!(edges.previous("TSLA"), Some(TrendLabel::VeryShort));
    }

    #[test]
    fn leaving_the_zone_hands_back_to_watch_list() {
        let edges = EdgeDetector::default();
        edges.observe(&with_quad(record("TSLA", TrendLabel::Neutral), 85.0), true, 1);

        let n = edges
            .observe(&with_quad(record("TSLA", TrendLabel::TryLong), 60.0), true, 2)
            .unwrap();
        assert_eq!(n.old_trend, Some(TrendLabel::VeryLong));
        assert_eq!(n.new_trend, TrendLabel::TryLong);
    }

    #[test]
    fn zone_boundaries_are_strict() {
        let edges = EdgeDetector::default();
        assert!(edges.observe(&with_quad(record("X", TrendLabel::Neutral), 20.0), false, 1).is_none());
        assert!(edges.observe(&with_quad(record("X", TrendLabel::Neutral), 80.0), false, 2).is_none());
    }
}
