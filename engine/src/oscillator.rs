//! Multi-series stochastic families (Quad-D4, Octo) and the per-symbol
//! previous-sample state used to detect direction switches and crossings.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::payload::Payload;
use crate::record::Direction;

/// Levels checked for two-sample crossings on every series.
pub const CROSS_LEVELS: [f64; 3] = [20.0, 50.0, 80.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OscillatorSource {
    Octo,
    QuadD4,
}

/// Zero-based series indices for the roles the classifier and the pattern
/// tracker read.
#[derive(Clone, Copy, Debug)]
struct Roles {
    fast: usize,
    fast3: usize,
    mid: usize,
    slow: usize,
}

impl OscillatorSource {
    pub fn series_count(self) -> usize {
        match self {
            OscillatorSource::Octo => 8,
            OscillatorSource::QuadD4 => 4,
        }
    }

    fn roles(self) -> Roles {
        match self {
            OscillatorSource::Octo => Roles {
                fast: 0,
                fast3: 2,
                mid: 3,
                slow: 7,
            },
            OscillatorSource::QuadD4 => Roles {
                fast: 0,
                fast3: 2,
                mid: 1,
                slow: 3,
            },
        }
    }

    fn signal_key(self) -> &'static str {
        match self {
            OscillatorSource::Octo => "octoStoch",
            OscillatorSource::QuadD4 => "d4Signal",
        }
    }
}

/// Inbound multi-series sample before it is diffed against history.
/// Values stay optional so callers can tell a missing series from a zero.
#[derive(Clone, Debug, PartialEq)]
pub struct OscillatorReading {
    pub source: OscillatorSource,
    pub signal: Option<String>,
    pub values: Vec<Option<f64>>,
    pub directions: Vec<Direction>,
}

impl OscillatorReading {
    pub fn from_payload(source: OscillatorSource, p: &Payload) -> Self {
        let n = source.series_count();
        Self {
            source,
            signal: p.label(source.signal_key()),
            values: (1..=n).map(|i| p.number(&format!("d{i}"))).collect(),
            directions: (1..=n)
                .map(|i| p.direction(&format!("d{i}Direction")))
                .collect(),
        }
    }

    fn value(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied().flatten()
    }

    pub fn fast(&self) -> Option<f64> {
        self.value(self.source.roles().fast)
    }

    pub fn fast3(&self) -> Option<f64> {
        self.value(self.source.roles().fast3)
    }

    pub fn slow(&self) -> Option<f64> {
        self.value(self.source.roles().slow)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelCross {
    pub level: f64,
    pub direction: Direction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesReading {
    pub name: String,
    pub value: f64,
    pub direction: Direction,
    pub switched: bool,
    pub switched_up: bool,
    pub switched_down: bool,
    pub crosses: Vec<LevelCross>,
}

/// A diffed multi-series sample, as cached and merged into records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorSnapshot {
    pub source: OscillatorSource,
    pub signal: Option<String>,
    pub series: Vec<SeriesReading>,
    pub bull_cross: bool,
    pub bear_cross: bool,
}

impl OscillatorSnapshot {
    pub fn fast(&self) -> Option<&SeriesReading> {
        self.series.get(self.source.roles().fast)
    }

    pub fn fast3(&self) -> Option<&SeriesReading> {
        self.series.get(self.source.roles().fast3)
    }

    pub fn mid(&self) -> Option<&SeriesReading> {
        self.series.get(self.source.roles().mid)
    }

    pub fn slow(&self) -> Option<&SeriesReading> {
        self.series.get(self.source.roles().slow)
    }

    pub fn slow_value(&self) -> f64 {
        self.slow().map(|s| s.value).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviousReading {
    pub values: Vec<f64>,
    pub directions: Vec<Direction>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossingSnapshot {
    pub octo: BTreeMap<String, PreviousReading>,
    pub quad_d4: BTreeMap<String, PreviousReading>,
}

/// Previous values/directions per (family, symbol).
///
/// Detection is strictly previous-vs-current, so callers must feed samples
/// for one symbol in arrival order.
#[derive(Default)]
pub struct CrossingTracker {
    octo: Mutex<BTreeMap<String, PreviousReading>>,
    quad_d4: Mutex<BTreeMap<String, PreviousReading>>,
}

impl CrossingTracker {
    fn slot(&self, source: OscillatorSource) -> &Mutex<BTreeMap<String, PreviousReading>> {
        match source {
            OscillatorSource::Octo => &self.octo,
            OscillatorSource::QuadD4 => &self.quad_d4,
        }
    }

    /// Diffs `reading` against the previous sample for `symbol` and stores it
    /// as the new previous sample.
    pub fn observe(&self, symbol: &str, reading: &OscillatorReading) -> OscillatorSnapshot {
        let values: Vec<f64> = reading.values.iter().map(|v| v.unwrap_or(0.0)).collect();
        let directions = reading.directions.clone();

        let mut slot = self.slot(reading.source).lock();
        let prev = slot.get(symbol);

        let series = values
            .iter()
            .zip(&directions)
            .enumerate()
            .map(|(i, (&value, &direction))| {
                let prev_direction = prev.and_then(|p| p.directions.get(i)).copied();
                let switched = prev_direction.is_some_and(|d| d != direction);
                let crosses = prev
                    .and_then(|p| p.values.get(i))
                    .map(|&pv| level_crosses(pv, value))
                    .unwrap_or_default();

                SeriesReading {
                    name: format!("d{}", i + 1),
                    value,
                    direction,
                    switched,
                    switched_up: switched && direction == Direction::Up,
                    switched_down: switched && direction == Direction::Down,
                    crosses,
                }
            })
            .collect();

        let (bull_cross, bear_cross) = prev
            .map(|p| fast_slow_cross(reading.source.roles(), p, &values, &directions))
            .unwrap_or((false, false));

        slot.insert(symbol.to_string(), PreviousReading { values, directions });

        OscillatorSnapshot {
            source: reading.source,
            signal: reading.signal.clone(),
            series,
            bull_cross,
            bear_cross,
        }
    }

    pub fn snapshot(&self) -> CrossingSnapshot {
        CrossingSnapshot {
            octo: self.octo.lock().clone(),
            quad_d4: self.quad_d4.lock().clone(),
        }
    }

    pub fn restore(&self, s: CrossingSnapshot) {
        *self.octo.lock() = s.octo;
        *self.quad_d4.lock() = s.quad_d4;
    }
}

/// Two-sample crossings; a value sits above a level when `value >= level`.
fn level_crosses(prev: f64, cur: f64) -> Vec<LevelCross> {
    CROSS_LEVELS
        .iter()
        .filter_map(|&level| {
            let (was_above, is_above) = (prev >= level, cur >= level);
            match (was_above, is_above) {
                (false, true) => Some(LevelCross {
                    level,
                    direction: Direction::Up,
                }),
                (true, false) => Some(LevelCross {
                    level,
                    direction: Direction::Down,
                }),
                _ => None,
            }
        })
        .collect()
}

/// Fast-vs-slow cross that only counts when both series move the same way.
fn fast_slow_cross(
    roles: Roles,
    prev: &PreviousReading,
    values: &[f64],
    directions: &[Direction],
) -> (bool, bool) {
    let (Some(&pf), Some(&ps), Some(&cf), Some(&cs)) = (
        prev.values.get(roles.fast),
        prev.values.get(roles.slow),
        values.get(roles.fast),
        values.get(roles.slow),
    ) else {
        return (false, false);
    };

    let fast_dir = directions.get(roles.fast).copied().unwrap_or_default();
    let slow_dir = directions.get(roles.slow).copied().unwrap_or_default();

    let (was_above, is_above) = (pf >= ps, cf >= cs);

    let bull = !was_above && is_above && fast_dir == Direction::Up && slow_dir == Direction::Up;
    let bear =
        was_above && !is_above && fast_dir == Direction::Down && slow_dir == Direction::Down;

    (bull, bear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quad(d1: f64, d1_dir: &str, d4: f64, d4_dir: &str) -> OscillatorReading {
        OscillatorReading::from_payload(
            OscillatorSource::QuadD4,
            &Payload::from_value(json!({
                "d4Signal": "x",
                "d1": d1, "d1Direction": d1_dir,
                "d2": 50, "d2Direction": "flat",
                "d3": 50, "d3Direction": "flat",
                "d4": d4, "d4Direction": d4_dir,
            })),
        )
    }

    #[test]
    fn first_sample_has_no_switches_or_crosses() {
        let tracker = CrossingTracker::default();
        let snap = tracker.observe("AAPL", &quad(30.0, "up", 40.0, "up"));

        assert!(snap.series.iter().all(|s| !s.switched && s.crosses.is_empty()));
        assert!(!snap.bull_cross && !snap.bear_cross);
        assert_eq!(snap.slow_value(), 40.0);
    }

    #[test]
    fn direction_switch_flags() {
        let tracker = CrossingTracker::default();
        tracker.observe("AAPL", &quad(30.0, "up", 40.0, "flat"));
        let snap = tracker.observe("AAPL", &quad(28.0, "down", 41.0, "up"));

        let fast = snap.fast().unwrap();
        assert!(fast.switched && fast.switched_down && !fast.switched_up);

        let slow = snap.slow().unwrap();
        assert!(slow.switched && slow.switched_up);

        let mid = snap.mid().unwrap();
        assert!(!mid.switched);
    }

    #[test]
    fn level_crossings_are_two_sample_sign_changes() {
        let tracker = CrossingTracker::default();
        tracker.observe("AAPL", &quad(45.0, "up", 85.0, "down"));
        let snap = tracker.observe("AAPL", &quad(55.0, "up", 15.0, "down"));

        assert_eq!(
            snap.fast().unwrap().crosses,
            vec![LevelCross {
                level: 50.0,
                direction: Direction::Up
            }]
        );

        let slow_levels: Vec<f64> = snap.slow().unwrap().crosses.iter().map(|c| c.level).collect();
        assert_eq!(slow_levels, vec![20.0, 50.0, 80.0]);
        assert!(
            snap.slow()
                .unwrap()
                .crosses
                .iter()
                .all(|c| c.direction == Direction::Down)
        );
    }

    #[test]
    fn bull_cross_requires_both_series_rising() {
        let tracker = CrossingTracker::default();
        tracker.observe("A", &quad(30.0, "up", 40.0, "up"));
        let snap = tracker.observe("A", &quad(45.0, "up", 42.0, "up"));
        assert!(snap.bull_cross);

        let tracker = CrossingTracker::default();
        tracker.observe("B", &quad(30.0, "up", 40.0, "flat"));
        let snap = tracker.observe("B", &quad(45.0, "up", 40.0, "flat"));
        assert!(!snap.bull_cross, "flat slow series must not produce a cross");
    }

    #[test]
    fn bear_cross_requires_both_series_falling() {
        let tracker = CrossingTracker::default();
        tracker.observe("A", &quad(60.0, "down", 50.0, "down"));
        let snap = tracker.observe("A", &quad(40.0, "down", 45.0, "down"));

        assert!(snap.bear_cross);
        assert!(!snap.bull_cross);
    }

    #[test]
    fn families_and_symbols_are_tracked_independently() {
        let tracker = CrossingTracker::default();
        tracker.observe("A", &quad(30.0, "up", 40.0, "up"));

        let other_symbol = tracker.observe("B", &quad(45.0, "up", 42.0, "up"));
        assert!(!other_symbol.bull_cross);

        let octo = OscillatorReading::from_payload(
            OscillatorSource::Octo,
            &Payload::from_value(json!({"octoStoch": true, "d1": 45, "d1Direction": "up"})),
        );
        let snap = tracker.observe("A", &octo);
        assert_eq!(snap.series.len(), 8);
        assert!(snap.series.iter().all(|s| !s.switched));
    }

    #[test]
    fn missing_series_read_as_zero_but_stay_optional_in_reading() {
        let reading = OscillatorReading::from_payload(
            OscillatorSource::Octo,
            &Payload::from_value(json!({"octoStoch": true, "d1": "bad", "d8": 70})),
        );

        assert_eq!(reading.fast(), None);
        assert_eq!(reading.fast3(), None);
        assert_eq!(reading.slow(), Some(70.0));

        let snap = CrossingTracker::default().observe("A", &reading);
        assert_eq!(snap.fast().unwrap().value, 0.0);
    }
}
