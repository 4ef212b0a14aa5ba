use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::big_trend::BigTrendDay;
use crate::cache::SideChannelsSnapshot;
use crate::error::EngineError;
use crate::merge::MergeEngine;
use crate::oscillator::CrossingSnapshot;
use crate::pattern::PatternTrack;
use crate::record::TrendLabel;
use crate::store::StoreSnapshot;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything the engine needs to resume after a restart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub version: u32,
    pub taken_at: u64,
    pub side_channels: SideChannelsSnapshot,
    pub crossings: CrossingSnapshot,
    pub patterns: BTreeMap<String, PatternTrack>,
    pub trends: BTreeMap<String, TrendLabel>,
    pub big_trend_days: BTreeMap<String, BigTrendDay>,
    pub alerts: StoreSnapshot,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(s)?)
    }
}

impl MergeEngine {
    /// Copies each component under its own lock, one at a time, so ingestion
    /// is never blocked for the whole capture.
    pub fn snapshot(&self, now_ms: u64) -> EngineSnapshot {
        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            taken_at: now_ms,
            side_channels: self.side.snapshot(),
            crossings: self.crossings.snapshot(),
            patterns: self.patterns.snapshot(),
            trends: self.edges.snapshot(),
            big_trend_days: self.big_trend_days.snapshot(),
            alerts: self.store.snapshot(),
        }
    }

    /// Replaces all state. Expired side-channel entries are restored as-is
    /// and evicted lazily on their next read.
    pub fn restore(&self, s: EngineSnapshot) {
        info!(
            version = s.version,
            taken_at = s.taken_at,
            symbols = s.alerts.latest.len(),
            "restoring engine state"
        );
        self.side.restore(s.side_channels);
        self.crossings.restore(s.crossings);
        self.patterns.restore(s.patterns);
        self.edges.restore(s.trends);
        self.big_trend_days.restore(s.big_trend_days);
        self.store.restore(s.alerts);
    }
}
