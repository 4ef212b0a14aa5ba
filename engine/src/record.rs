use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::big_trend::BigTrendDay;
use crate::oscillator::OscillatorSnapshot;
use crate::pattern::PatternState;
use crate::payload::Payload;

/// Oscillator slope as reported by producers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    #[default]
    Flat,
}

impl Direction {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Direction::Up,
            "down" => Direction::Down,
            _ => Direction::Flat,
        }
    }
}

/// Price movement relative to the previous primary update for the symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    Unchanged,
}

impl PriceDirection {
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            PriceDirection::Up
        } else if current < previous {
            PriceDirection::Down
        } else {
            PriceDirection::Unchanged
        }
    }
}

/// Trend labels produced by the classifier and the extreme trigger.
///
/// A pipeline may report a label outside the known set; it is kept verbatim
/// as `Reported`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrendLabel {
    DeadLong,
    HeavyBuy,
    TryLong,
    SwitchLong,
    #[default]
    Neutral,
    SwitchShort,
    TryShort,
    VeryShort,
    DeadShort,
    BullCross,
    BearCross,
    VeryLong,
    Reported(String),
}

impl TrendLabel {
    const KNOWN: [TrendLabel; 12] = [
        TrendLabel::DeadLong,
        TrendLabel::HeavyBuy,
        TrendLabel::TryLong,
        TrendLabel::SwitchLong,
        TrendLabel::Neutral,
        TrendLabel::SwitchShort,
        TrendLabel::TryShort,
        TrendLabel::VeryShort,
        TrendLabel::DeadShort,
        TrendLabel::BullCross,
        TrendLabel::BearCross,
        TrendLabel::VeryLong,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TrendLabel::DeadLong => "Dead Long",
            TrendLabel::HeavyBuy => "Heavy Buy",
            TrendLabel::TryLong => "Try Long",
            TrendLabel::SwitchLong => "Switch Long",
            TrendLabel::Neutral => "Neutral",
            TrendLabel::SwitchShort => "Switch Short",
            TrendLabel::TryShort => "Try Short",
            TrendLabel::VeryShort => "Very Short",
            TrendLabel::DeadShort => "Dead Short",
            TrendLabel::BullCross => "BULL Cross",
            TrendLabel::BearCross => "BEAR Cross",
            TrendLabel::VeryLong => "Very Long",
            TrendLabel::Reported(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        Self::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(s))
            .cloned()
            .unwrap_or_else(|| TrendLabel::Reported(s.to_string()))
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, TrendLabel::Neutral)
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TrendLabel {
    fn from(s: String) -> Self {
        TrendLabel::parse(&s)
    }
}

impl From<TrendLabel> for String {
    fn from(t: TrendLabel) -> Self {
        t.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VwapSignal {
    pub direction: Direction,
    pub vwap: Option<f64>,
}

impl VwapSignal {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            direction: p.direction("vwapDirection"),
            vwap: p.number("vwap"),
        }
    }
}

/// Quad-stochastic D1/D2 reading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuadSignal {
    pub signal: Option<String>,
    pub d1: f64,
    pub d2: f64,
    pub d1_direction: Direction,
    pub d2_direction: Direction,
}

impl QuadSignal {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            signal: p.label("quadStoch"),
            d1: p.oscillator("d1"),
            d2: p.oscillator("d2"),
            d1_direction: p.direction("d1Direction"),
            d2_direction: p.direction("d2Direction"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdSignal {
    pub crossing: String,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub histogram: Option<f64>,
    pub timeframe: Option<String>,
}

impl MacdSignal {
    /// A blank crossing label reads as empty, as for CCI.
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            crossing: p.label("macdCrossing").unwrap_or_default(),
            macd: p.number("macd"),
            signal_line: p.number("macdSignal"),
            histogram: p.number("macdHistogram"),
            timeframe: p.label("timeframe"),
        }
    }

    /// MACD fields riding on a primary update, if it labels a crossing.
    pub fn carried_by(p: &Payload) -> Option<Self> {
        p.label("macdCrossing").map(|_| Self::from_payload(p))
    }

    /// Same as [`MacdSignal::carried_by`], over a record's unmapped fields.
    pub fn from_fields(fields: &Map<String, Value>) -> Option<Self> {
        Self::carried_by(&Payload::new(fields.clone()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayChange {
    pub change_from_prev_day: f64,
    pub volume: Option<f64>,
}

impl DayChange {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            change_from_prev_day: p.number("changeFromPrevDay").unwrap_or(0.0),
            volume: p.number("volume"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CciSignal {
    pub signal: String,
    pub value: f64,
    pub direction: Direction,
}

impl CciSignal {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            signal: p.label("cciSignal").unwrap_or_default(),
            value: p.oscillator("cci"),
            direction: p.direction("cciDirection"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbSession {
    London,
    Ny,
}

impl OrbSession {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "london" => Some(OrbSession::London),
            "ny" | "newyork" | "new_york" | "new york" => Some(OrbSession::Ny),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            OrbSession::London => "london",
            OrbSession::Ny => "ny",
        }
    }

    /// ORB entries are cached per symbol and session.
    pub fn cache_key(self, symbol: &str) -> String {
        format!("{symbol}_{}", self.suffix())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbSignal {
    pub session: OrbSession,
    pub status: String,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl OrbSignal {
    pub fn from_payload(p: &Payload) -> Option<Self> {
        let session = OrbSession::parse(&p.label("orbType")?)?;
        Some(Self {
            session,
            status: p.label("orbStatus").unwrap_or_default(),
            high: p.number("orbHigh"),
            low: p.number("orbLow"),
        })
    }
}

/// Solo / dual stochastic reading. Solo readings leave `d2` empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StochSignal {
    pub d1: f64,
    pub d1_direction: Direction,
    pub d2: Option<f64>,
    pub d2_direction: Option<Direction>,
}

impl StochSignal {
    pub fn solo(p: &Payload) -> Self {
        Self {
            d1: p.oscillator("d1"),
            d1_direction: p.direction("d1Direction"),
            d2: None,
            d2_direction: None,
        }
    }

    pub fn dual(p: &Payload) -> Self {
        Self {
            d1: p.oscillator("d1"),
            d1_direction: p.direction("d1Direction"),
            d2: Some(p.oscillator("d2")),
            d2_direction: Some(p.direction("d2Direction")),
        }
    }
}

/// Keys a primary update maps onto typed record fields; everything else is
/// carried in `AlertRecord::fields`.
const PRIMARY_KEYS: &[&str] = &[
    "symbol",
    "price",
    "volume",
    "changeFromPrevDay",
    "trend",
    "patternType",
    "patternValue",
    "patternCount",
];

/// The merged, per-symbol view of every indicator family.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub symbol: String,
    pub received_at: u64,
    pub updated_at: u64,

    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub change_from_prev_day: Option<f64>,
    pub price_direction: Option<PriceDirection>,
    pub sector: Option<String>,

    /// Trend reported by the upstream pipeline, if any.
    pub reported_trend: Option<TrendLabel>,

    pub vwap: Option<VwapSignal>,
    pub quad: Option<QuadSignal>,
    pub oscillator: Option<OscillatorSnapshot>,
    pub macd: Option<MacdSignal>,
    pub cci: Option<CciSignal>,
    pub orb_london: Option<OrbSignal>,
    pub orb_ny: Option<OrbSignal>,
    pub solo: Option<StochSignal>,
    pub dual: Option<StochSignal>,
    pub pattern: Option<PatternState>,
    pub big_trend_day: Option<BigTrendDay>,

    pub calculated_trend: TrendLabel,

    /// Unmapped inbound fields, carried verbatim.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl AlertRecord {
    pub fn empty(symbol: &str, now_ms: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            received_at: now_ms,
            updated_at: now_ms,
            ..Default::default()
        }
    }

    /// Starts a merged record from a primary update.
    pub fn from_primary(symbol: &str, p: &Payload, now_ms: u64) -> Self {
        let pattern = p
            .label("patternType")
            .and_then(|kind| PatternState::reported(&kind, p, now_ms));

        Self {
            symbol: symbol.to_string(),
            received_at: now_ms,
            updated_at: now_ms,
            price: p.number("price"),
            volume: p.number("volume"),
            change_from_prev_day: p.number("changeFromPrevDay"),
            reported_trend: p.label("trend").map(|t| TrendLabel::parse(&t)),
            macd: MacdSignal::carried_by(p),
            pattern,
            fields: p.without(PRIMARY_KEYS),
            ..Default::default()
        }
    }

    /// Value watched by the global extreme trigger: the slow line (D2) of the
    /// quad-stochastic D1/D2 pair.
    pub fn extreme_value(&self) -> Option<f64> {
        self.quad.as_ref().map(|q| q.d2)
    }

    pub fn slow_value(&self) -> f64 {
        self.oscillator
            .as_ref()
            .map(|o| o.slow_value())
            .unwrap_or(0.0)
    }
}
