//! The merge engine: routes each inbound update to its side channel or to a
//! full primary merge, then classifies and edge-detects the result.

use tracing::{debug, warn};

use common::time::local_day_key;

use crate::big_trend::BigTrendDays;
use crate::cache::SideChannels;
use crate::error::EngineError;
use crate::kind::UpdateKind;
use crate::notify::{EdgeDetector, TrendNotification};
use crate::oscillator::{CrossingTracker, OscillatorReading, OscillatorSource};
use crate::pattern::PatternTracker;
use crate::payload::Payload;
use crate::projection::Projection;
use crate::record::{
    AlertRecord, CciSignal, DayChange, MacdSignal, OrbSession, OrbSignal, PriceDirection,
    QuadSignal, StochSignal, VwapSignal,
};
use crate::sector::SectorDirectory;
use crate::store::AlertStore;
use crate::trend;
use crate::watchlist::Watchlist;

#[derive(Clone, Debug)]
pub struct IngestOutcome {
    pub kind: UpdateKind,
    /// The record as it stands after this update; `None` when the update had
    /// no usable symbol.
    pub record: Option<AlertRecord>,
    /// To be handed to the transports by the caller.
    pub notification: Option<TrendNotification>,
}

/// Owns every piece of per-symbol state.
///
/// Each component guards itself with a short internal lock. Callers must
/// still feed updates for one symbol in arrival order.
#[derive(Default)]
pub struct MergeEngine {
    pub(crate) side: SideChannels,
    pub(crate) crossings: CrossingTracker,
    pub(crate) patterns: PatternTracker,
    pub(crate) big_trend_days: BigTrendDays,
    pub(crate) edges: EdgeDetector,
    pub(crate) store: AlertStore,
    watchlist: Watchlist,
    sectors: SectorDirectory,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn sectors(&self) -> &SectorDirectory {
        &self.sectors
    }

    pub fn side_channels(&self) -> &SideChannels {
        &self.side
    }

    pub fn previous_trend(&self, symbol: &str) -> Option<crate::record::TrendLabel> {
        self.edges.previous(symbol)
    }

    /// Processes one inbound update. Never fails: malformed updates are kept
    /// in raw history and otherwise ignored.
    pub fn ingest(&self, payload: Payload, now_ms: u64) -> IngestOutcome {
        let kind = UpdateKind::classify(&payload);
        self.store.record_raw(payload.as_map().clone(), now_ms);

        let symbol = match payload.symbol() {
            Ok(s) => s.to_string(),
            Err(e) => {
                warn!(%kind, error = %e, "update ignored");
                return IngestOutcome {
                    kind,
                    record: None,
                    notification: None,
                };
            }
        };
        debug!(symbol = %symbol, %kind, "ingest");

        let (record, notification) = match kind {
            UpdateKind::Primary => self.merge_primary(&symbol, &payload, now_ms),
            _ => self.apply_side(kind, &symbol, &payload, now_ms),
        };

        IngestOutcome {
            kind,
            record: Some(record),
            notification,
        }
    }

    fn apply_side(
        &self,
        kind: UpdateKind,
        symbol: &str,
        p: &Payload,
        now_ms: u64,
    ) -> (AlertRecord, Option<TrendNotification>) {
        let projection = self.side_projection(kind, symbol, p, now_ms);

        let record = self.store.upsert_with(symbol, now_ms, |rec| {
            if let Some(projection) = projection {
                projection.apply(rec);
            }
            self.refresh_side_fields(rec, symbol, now_ms);
            rec.calculated_trend = trend::classify(rec);
        });

        let notification = match kind {
            UpdateKind::Octo => self.detect_edge(&record, now_ms),
            _ => None,
        };
        (record, notification)
    }

    /// Writes the side channel for `kind` and returns what the latest record
    /// should absorb.
    fn side_projection(
        &self,
        kind: UpdateKind,
        symbol: &str,
        p: &Payload,
        now_ms: u64,
    ) -> Option<Projection> {
        let side = &self.side;
        match kind {
            UpdateKind::Vwap => {
                let s = VwapSignal::from_payload(p);
                side.vwap.put(symbol, s.clone(), now_ms);
                Some(Projection::Vwap(s))
            }
            UpdateKind::QuadD1D2 => {
                let s = QuadSignal::from_payload(p);
                side.quad.put(symbol, s.clone(), now_ms);
                Some(Projection::Quad(s))
            }
            UpdateKind::QuadD4 => {
                let reading = OscillatorReading::from_payload(OscillatorSource::QuadD4, p);
                let snapshot = self.crossings.observe(symbol, &reading);
                side.quad_d4.put(symbol, snapshot.clone(), now_ms);

                if side.octo.get_if_valid(symbol, now_ms).is_some() {
                    debug!(symbol, "octo still valid; D4 not projected");
                    return None;
                }
                Some(Projection::Oscillator {
                    snapshot,
                    pattern: None,
                })
            }
            UpdateKind::Octo => {
                let reading = OscillatorReading::from_payload(OscillatorSource::Octo, p);
                let snapshot = self.crossings.observe(symbol, &reading);
                side.octo.put(symbol, snapshot.clone(), now_ms);
                let pattern = self.patterns.observe(symbol, &reading, now_ms);
                Some(Projection::Oscillator { snapshot, pattern })
            }
            UpdateKind::Macd => {
                let s = MacdSignal::from_payload(p);
                if s.crossing.is_empty() {
                    debug!(symbol, "MACD update without a crossing label");
                }
                side.macd.put(symbol, s.clone(), now_ms);
                Some(Projection::Macd(s))
            }
            UpdateKind::DayChange => {
                let s = DayChange::from_payload(p);
                side.day_change.put(symbol, s.clone(), now_ms);
                Some(Projection::DayChange(s))
            }
            UpdateKind::Cci => {
                let s = CciSignal::from_payload(p);
                side.cci.put(symbol, s.clone(), now_ms);
                Some(Projection::Cci(s))
            }
            UpdateKind::Orb => {
                let Some(s) = OrbSignal::from_payload(p) else {
                    let err = EngineError::UnknownOrbSession(p.label("orbType").unwrap_or_default());
                    warn!(symbol, error = %err, "ORB update not cached");
                    return None;
                };
                side.orb.put(&s.session.cache_key(symbol), s.clone(), now_ms);
                Some(Projection::Orb(s))
            }
            UpdateKind::Solo => {
                let s = StochSignal::solo(p);
                side.solo.put(symbol, s.clone(), now_ms);
                Some(Projection::Solo(s))
            }
            UpdateKind::Dual => {
                let signal = StochSignal::dual(p);
                side.dual.put(symbol, signal.clone(), now_ms);
                let big_trend_day = self.big_trend_days.evaluate(
                    symbol,
                    signal.d1,
                    signal.d2.unwrap_or_default(),
                    &local_day_key(now_ms),
                    now_ms,
                );
                Some(Projection::Dual {
                    signal,
                    big_trend_day,
                })
            }
            UpdateKind::Primary => None,
        }
    }

    fn merge_primary(
        &self,
        symbol: &str,
        p: &Payload,
        now_ms: u64,
    ) -> (AlertRecord, Option<TrendNotification>) {
        let mut rec = AlertRecord::from_primary(symbol, p, now_ms);

        if let Some(day_change) = self.side.day_change.get_if_valid(symbol, now_ms) {
            Projection::DayChange(day_change).apply(&mut rec);
        }

        self.refresh_side_fields(&mut rec, symbol, now_ms);
        if rec.pattern.is_none() {
            rec.pattern = self.patterns.current(symbol);
        }

        rec.price_direction = match (self.store.latest_price(symbol), rec.price) {
            (Some(prev), Some(cur)) => Some(PriceDirection::between(prev, cur)),
            _ => None,
        };
        rec.sector = self.sectors.lookup(symbol, now_ms);
        rec.calculated_trend = trend::classify(&rec);

        let notification = self.detect_edge(&rec, now_ms);
        self.store.record(rec.clone());
        (rec, notification)
    }

    /// Re-reads every family from its side channel, so a family whose window
    /// has passed drops off the record before it is classified. Day change
    /// and pattern values are record data once merged and are left alone.
    fn refresh_side_fields(&self, rec: &mut AlertRecord, symbol: &str, now_ms: u64) {
        let side = &self.side;

        rec.vwap = side.vwap.get_if_valid(symbol, now_ms);
        rec.quad = side.quad.get_if_valid(symbol, now_ms);
        // Octo overrides D4; D4 is only consulted once Octo has expired.
        rec.oscillator = side
            .octo
            .get_if_valid(symbol, now_ms)
            .or_else(|| side.quad_d4.get_if_valid(symbol, now_ms));
        rec.macd = side
            .macd
            .get_if_valid(symbol, now_ms)
            .or_else(|| MacdSignal::from_fields(&rec.fields));
        rec.cci = side.cci.get_if_valid(symbol, now_ms);
        rec.orb_london = side
            .orb
            .get_if_valid(&OrbSession::London.cache_key(symbol), now_ms);
        rec.orb_ny = side
            .orb
            .get_if_valid(&OrbSession::Ny.cache_key(symbol), now_ms);
        rec.solo = side.solo.get_if_valid(symbol, now_ms);
        rec.dual = side.dual.get_if_valid(symbol, now_ms);
        rec.big_trend_day = self
            .big_trend_days
            .for_day(symbol, &local_day_key(now_ms));
    }

    fn detect_edge(&self, rec: &AlertRecord, now_ms: u64) -> Option<TrendNotification> {
        let starred = self.watchlist.is_starred(&rec.symbol);
        self.edges.observe(rec, starred, now_ms)
    }
}
