mod side_channel;

pub use side_channel::{SideChannelCache, SideEntry};

use serde::{Deserialize, Serialize};

use crate::oscillator::OscillatorSnapshot;
use crate::record::{
    CciSignal, DayChange, MacdSignal, OrbSignal, QuadSignal, StochSignal, VwapSignal,
};
use common::time::MINUTE_MS;

/// Independent indicator producers that feed side-channel caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Vwap,
    QuadD1D2,
    QuadD4,
    Octo,
    Macd,
    Cci,
    Orb,
    Solo,
    Dual,
    DayChange,
}

impl Family {
    pub fn window_ms(self) -> u64 {
        match self {
            Family::Vwap => 5 * MINUTE_MS,
            Family::QuadD1D2 => 10 * MINUTE_MS,
            Family::QuadD4 | Family::Octo => 60 * MINUTE_MS,
            Family::Macd => 15 * MINUTE_MS,
            Family::Cci => 60 * MINUTE_MS,
            Family::Orb => 240 * MINUTE_MS,
            Family::Solo | Family::Dual => 60 * MINUTE_MS,
            Family::DayChange => 60 * MINUTE_MS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Vwap => "vwap",
            Family::QuadD1D2 => "quad_d1d2",
            Family::QuadD4 => "quad_d4",
            Family::Octo => "octo",
            Family::Macd => "macd",
            Family::Cci => "cci",
            Family::Orb => "orb",
            Family::Solo => "solo",
            Family::Dual => "dual",
            Family::DayChange => "day_change",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cache per family, owned by the merge engine.
pub struct SideChannels {
    pub vwap: SideChannelCache<VwapSignal>,
    pub quad: SideChannelCache<QuadSignal>,
    pub quad_d4: SideChannelCache<OscillatorSnapshot>,
    pub octo: SideChannelCache<OscillatorSnapshot>,
    pub macd: SideChannelCache<MacdSignal>,
    pub cci: SideChannelCache<CciSignal>,
    pub orb: SideChannelCache<OrbSignal>,
    pub solo: SideChannelCache<StochSignal>,
    pub dual: SideChannelCache<StochSignal>,
    pub day_change: SideChannelCache<DayChange>,
}

impl Default for SideChannels {
    fn default() -> Self {
        Self {
            vwap: SideChannelCache::new(Family::Vwap),
            quad: SideChannelCache::new(Family::QuadD1D2),
            quad_d4: SideChannelCache::new(Family::QuadD4),
            octo: SideChannelCache::new(Family::Octo),
            macd: SideChannelCache::new(Family::Macd),
            cci: SideChannelCache::new(Family::Cci),
            orb: SideChannelCache::new(Family::Orb),
            solo: SideChannelCache::new(Family::Solo),
            dual: SideChannelCache::new(Family::Dual),
            day_change: SideChannelCache::new(Family::DayChange),
        }
    }
}

type Entries<T> = Vec<(String, SideEntry<T>)>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideChannelsSnapshot {
    pub vwap: Entries<VwapSignal>,
    pub quad: Entries<QuadSignal>,
    pub quad_d4: Entries<OscillatorSnapshot>,
    pub octo: Entries<OscillatorSnapshot>,
    pub macd: Entries<MacdSignal>,
    pub cci: Entries<CciSignal>,
    pub orb: Entries<OrbSignal>,
    pub solo: Entries<StochSignal>,
    pub dual: Entries<StochSignal>,
    pub day_change: Entries<DayChange>,
}

impl SideChannels {
    /// Copies each cache under its own lock; no two caches are locked at once.
    pub fn snapshot(&self) -> SideChannelsSnapshot {
        SideChannelsSnapshot {
            vwap: self.vwap.entries(),
            quad: self.quad.entries(),
            quad_d4: self.quad_d4.entries(),
            octo: self.octo.entries(),
            macd: self.macd.entries(),
            cci: self.cci.entries(),
            orb: self.orb.entries(),
            solo: self.solo.entries(),
            dual: self.dual.entries(),
            day_change: self.day_change.entries(),
        }
    }

    pub fn restore(&self, s: SideChannelsSnapshot) {
        self.vwap.restore(s.vwap);
        self.quad.restore(s.quad);
        self.quad_d4.restore(s.quad_d4);
        self.octo.restore(s.octo);
        self.macd.restore(s.macd);
        self.cci.restore(s.cci);
        self.orb.restore(s.orb);
        self.solo.restore(s.solo);
        self.dual.restore(s.dual);
        self.day_change.restore(s.day_change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_match_family_table() {
        assert_eq!(Family::Vwap.window_ms(), 300_000);
        assert_eq!(Family::QuadD1D2.window_ms(), 600_000);
        assert_eq!(Family::QuadD4.window_ms(), 3_600_000);
        assert_eq!(Family::Octo.window_ms(), 3_600_000);
        assert_eq!(Family::Macd.window_ms(), 900_000);
        assert_eq!(Family::Cci.window_ms(), 3_600_000);
        assert_eq!(Family::Orb.window_ms(), 14_400_000);
        assert_eq!(Family::Solo.window_ms(), 3_600_000);
        assert_eq!(Family::Dual.window_ms(), 3_600_000);
    }
}
