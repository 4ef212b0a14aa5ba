//! Higher-low / lower-high continuation tracking on the Octo family.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::oscillator::OscillatorReading;
use crate::payload::Payload;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "Higher Low")]
    HigherLow,
    #[serde(rename = "Lower High")]
    LowerHigh,
}

impl PatternKind {
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "higherlow" | "hl" => Some(PatternKind::HigherLow),
            "lowerhigh" | "lh" => Some(PatternKind::LowerHigh),
            _ => None,
        }
    }
}

/// Which series produced the pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternSource {
    Fast3,
    Slow,
    Reported,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternState {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub source: PatternSource,
    /// Anchor pivot value; the fast series moving past it adversely is a break.
    pub last_value: f64,
    pub start_time: u64,
    pub last_updated: u64,
    pub count: u32,
    /// Sticky until a fresh pattern is detected.
    pub trend_break: bool,
}

impl PatternState {
    /// Pattern fields carried directly on a primary update.
    pub fn reported(kind: &str, p: &Payload, now_ms: u64) -> Option<Self> {
        Some(Self {
            kind: PatternKind::parse(kind)?,
            source: PatternSource::Reported,
            last_value: p.number("patternValue").unwrap_or(0.0),
            start_time: now_ms,
            last_updated: now_ms,
            count: p
                .number("patternCount")
                .filter(|c| *c >= 1.0)
                .map(|c| c as u32)
                .unwrap_or(1),
            trend_break: false,
        })
    }

    fn is_broken_by(&self, fast: f64) -> bool {
        match self.kind {
            PatternKind::HigherLow => fast < self.last_value,
            PatternKind::LowerHigh => fast > self.last_value,
        }
    }
}

/// Last three samples of one series plus the most recent trough and peak.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotSeries {
    recent: Vec<f64>,
    last_low: Option<f64>,
    last_high: Option<f64>,
}

impl PivotSeries {
    /// Pushes a sample; when the middle of the last three samples is a pivot,
    /// compares it with the previous pivot of the same side.
    fn push(&mut self, v: f64) -> Option<(PatternKind, f64)> {
        self.recent.push(v);
        if self.recent.len() > 3 {
            self.recent.remove(0);
        }
        let &[a, b, c] = self.recent.as_slice() else {
            return None;
        };

        if b < a && b < c {
            let fresh = self
                .last_low
                .filter(|&low| b > low)
                .map(|_| (PatternKind::HigherLow, b));
            self.last_low = Some(b);
            return fresh;
        }

        if b > a && b > c {
            let fresh = self
                .last_high
                .filter(|&high| b < high)
                .map(|_| (PatternKind::LowerHigh, b));
            self.last_high = Some(b);
            return fresh;
        }

        None
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternTrack {
    pub state: Option<PatternState>,
    fast3: PivotSeries,
    slow: PivotSeries,
}

#[derive(Default)]
pub struct PatternTracker {
    tracks: Mutex<BTreeMap<String, PatternTrack>>,
}

impl PatternTracker {
    /// Feeds one Octo sample and returns the resulting pattern, if any.
    pub fn observe(
        &self,
        symbol: &str,
        reading: &OscillatorReading,
        now_ms: u64,
    ) -> Option<PatternState> {
        let mut tracks = self.tracks.lock();
        let track = tracks.entry(symbol.to_string()).or_default();

        // Both histories advance on every sample; fast-3 wins when both fire.
        let from_fast3 = reading
            .fast3()
            .and_then(|v| track.fast3.push(v))
            .map(|(kind, v)| (kind, v, PatternSource::Fast3));
        let from_slow = reading
            .slow()
            .and_then(|v| track.slow.push(v))
            .map(|(kind, v)| (kind, v, PatternSource::Slow));

        match from_fast3.or(from_slow) {
            Some((kind, value, source)) => {
                let same_kind = track.state.as_ref().is_some_and(|s| s.kind == kind);
                if same_kind {
                    if let Some(state) = track.state.as_mut() {
                        state.count += 1;
                        state.last_value = value;
                        state.source = source;
                        state.last_updated = now_ms;
                        state.trend_break = false;
                    }
                } else {
                    debug!(symbol, ?kind, value, "new pattern detected");
                    track.state = Some(PatternState {
                        kind,
                        source,
                        last_value: value,
                        start_time: now_ms,
                        last_updated: now_ms,
                        count: 1,
                        trend_break: false,
                    });
                }
            }
            None => {
                if let Some(state) = track.state.as_mut() {
                    state.last_updated = now_ms;
                    state.count += 1;
                    if !state.trend_break && reading.fast().is_some_and(|f| state.is_broken_by(f)) {
                        debug!(symbol, kind = ?state.kind, anchor = state.last_value, "pattern trend break");
                        state.trend_break = true;
                    }
                }
            }
        }

        track.state.clone()
    }

    pub fn current(&self, symbol: &str) -> Option<PatternState> {
        self.tracks.lock().get(symbol).and_then(|t| t.state.clone())
    }

    pub fn snapshot(&self) -> BTreeMap<String, PatternTrack> {
        self.tracks.lock().clone()
    }

    pub fn restore(&self, tracks: BTreeMap<String, PatternTrack>) {
        *self.tracks.lock() = tracks;
    }
}
