use crate::big_trend::BigTrendDay;
use crate::oscillator::OscillatorSnapshot;
use crate::pattern::PatternState;
use crate::record::{
    AlertRecord, CciSignal, DayChange, MacdSignal, OrbSession, OrbSignal, QuadSignal,
    StochSignal, VwapSignal,
};

/// The slice of an [`AlertRecord`] one side-channel update owns.
///
/// Every non-primary update kind maps to exactly one variant, so the
/// "merge into existing record or create one" logic lives in a single place.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection {
    Vwap(VwapSignal),
    Quad(QuadSignal),
    Oscillator {
        snapshot: OscillatorSnapshot,
        pattern: Option<PatternState>,
    },
    Macd(MacdSignal),
    DayChange(DayChange),
    Cci(CciSignal),
    Orb(OrbSignal),
    Solo(StochSignal),
    Dual {
        signal: StochSignal,
        big_trend_day: Option<BigTrendDay>,
    },
}

impl Projection {
    pub fn apply(self, rec: &mut AlertRecord) {
        match self {
            Projection::Vwap(s) => rec.vwap = Some(s),
            Projection::Quad(s) => rec.quad = Some(s),
            Projection::Oscillator { snapshot, pattern } => {
                rec.oscillator = Some(snapshot);
                if pattern.is_some() {
                    rec.pattern = pattern;
                }
            }
            Projection::Macd(s) => rec.macd = Some(s),
            Projection::DayChange(s) => {
                rec.change_from_prev_day = Some(s.change_from_prev_day);
                // A primary update's own volume always wins.
                if rec.volume.is_none() {
                    rec.volume = s.volume;
                }
            }
            Projection::Cci(s) => rec.cci = Some(s),
            Projection::Orb(s) => match s.session {
                OrbSession::London => rec.orb_london = Some(s),
                OrbSession::Ny => rec.orb_ny = Some(s),
            },
            Projection::Solo(s) => rec.solo = Some(s),
            Projection::Dual {
                signal,
                big_trend_day,
            } => {
                rec.dual = Some(signal);
                if big_trend_day.is_some() {
                    rec.big_trend_day = big_trend_day;
                }
            }
        }
    }
}
