use serde_json::{json, Value};

use common::time::MINUTE_MS;
use signal_engine::{
    EngineSnapshot, MergeEngine, NotificationTrigger, Payload, TrendLabel, UpdateKind,
};

fn octo(symbol: &str, fast: f64, slow: f64) -> Payload {
    Payload::from_value(json!({
        "symbol": symbol,
        "octoStoch": "update",
        "d1": fast, "d1Direction": "up",
        "d2": 60, "d2Direction": "up",
        "d3": 55, "d3Direction": "up",
        "d4": 58, "d4Direction": "up",
        "d5": 50, "d5Direction": "flat",
        "d6": 50, "d6Direction": "flat",
        "d7": 50, "d7Direction": "flat",
        "d8": slow, "d8Direction": "up",
    }))
}

fn primary(symbol: &str, price: f64) -> Payload {
    Payload::from_value(json!({ "symbol": symbol, "price": price }))
}

#[test]
fn octo_scenario_try_long_then_dead_long_notifies_starred_symbol() {
    let engine = MergeEngine::new();
    engine.watchlist().star("AAPL");

    let first = engine.ingest(octo("AAPL", 72.0, 68.0), 0);
    assert_eq!(first.kind, UpdateKind::Octo);
    assert_eq!(first.record.unwrap().calculated_trend, TrendLabel::TryLong);
    assert!(first.notification.is_none(), "first observation is silent");

    let second = engine.ingest(octo("AAPL", 72.0, 92.0), MINUTE_MS);
    assert_eq!(second.record.unwrap().calculated_trend, TrendLabel::DeadLong);

    let n = second.notification.expect("starred trend change");
    assert_eq!(n.symbol, "AAPL");
    assert_eq!(n.old_trend, Some(TrendLabel::TryLong));
    assert_eq!(n.new_trend, TrendLabel::DeadLong);
    assert_eq!(n.trigger, NotificationTrigger::TrendChange);
    assert_eq!(n.value, 92.0);
}

#[test]
fn same_scenario_without_star_is_silent() {
    let engine = MergeEngine::new();
    engine.ingest(octo("AAPL", 72.0, 68.0), 0);
    let second = engine.ingest(octo("AAPL", 72.0, 92.0), MINUTE_MS);
    assert!(second.notification.is_none());
    assert_eq!(engine.previous_trend("AAPL"), Some(TrendLabel::DeadLong));
}

#[test]
fn global_extreme_trigger_fires_once_for_unstarred_symbol() {
    let engine = MergeEngine::new();
    let quad = |d2: f64| {
        Payload::from_value(json!({
            "symbol": "TSLA", "quadStoch": "cross", "d1": 30, "d2": d2,
            "d1Direction": "down", "d2Direction": "down"
        }))
    };

    engine.ingest(quad(35.0), 0);

    let out = engine.ingest(primary("TSLA", 180.0), MINUTE_MS);
    assert!(out.notification.is_none());

    engine.ingest(quad(15.0), 2 * MINUTE_MS);
    let out = engine.ingest(primary("TSLA", 179.0), 3 * MINUTE_MS);
    let n = out.notification.expect("extreme zone entered");
    assert_eq!(n.trigger, NotificationTrigger::Extreme);
    assert_eq!(n.new_trend, TrendLabel::VeryShort);
    assert_eq!(n.price, Some(179.0));

    engine.ingest(quad(12.0), 4 * MINUTE_MS);
    let out = engine.ingest(primary("TSLA", 178.0), 5 * MINUTE_MS);
    assert!(out.notification.is_none());
}

#[test]
fn vwap_entry_expires_between_four_and_six_minutes() {
    let engine = MergeEngine::new();
    engine.ingest(
        Payload::from_value(json!({"symbol": "AAPL", "vwapCrossing": "true", "vwapDirection": "up"})),
        0,
    );

    let at_4 = engine.ingest(primary("AAPL", 1.0), 4 * MINUTE_MS).record.unwrap();
    assert!(at_4.vwap.is_some());

    let at_6 = engine.ingest(primary("AAPL", 1.0), 6 * MINUTE_MS).record.unwrap();
    assert!(at_6.vwap.is_none());
    assert!(engine.side_channels().vwap.is_empty());
}

#[test]
fn octo_overrides_d4_until_it_expires() {
    let engine = MergeEngine::new();
    let d4 = Payload::from_value(json!({
        "symbol": "AAPL", "d4Signal": "x",
        "d1": 10, "d2": 20, "d3": 30, "d4": 40,
        "d1Direction": "down", "d2Direction": "down", "d3Direction": "down", "d4Direction": "down"
    }));

    engine.ingest(octo("AAPL", 72.0, 68.0), 0);
    let after_d4 = engine.ingest(d4, MINUTE_MS).record.unwrap();
    assert_eq!(after_d4.slow_value(), 68.0, "D4 must not replace a valid octo reading");

    let merged = engine.ingest(primary("AAPL", 1.0), 30 * MINUTE_MS).record.unwrap();
    assert_eq!(merged.slow_value(), 68.0);

    // octo written at 0 expires first; D4 written at 1 min is still valid
    let merged = engine.ingest(primary("AAPL", 1.0), 60 * MINUTE_MS + MINUTE_MS / 2).record.unwrap();
    assert_eq!(merged.slow_value(), 40.0);

    let merged = engine.ingest(primary("AAPL", 1.0), 120 * MINUTE_MS).record.unwrap();
    assert!(merged.oscillator.is_none());
}

#[test]
fn missing_symbol_lands_only_in_raw_history() {
    let engine = MergeEngine::new();
    let out = engine.ingest(Payload::from_value(json!({"price": 3.0})), 0);
    assert!(out.record.is_none());

    let out = engine.ingest(Payload::from_value(Value::String("garbage".into())), 1);
    assert!(out.record.is_none());

    assert_eq!(engine.store().raw_history().len(), 2);
    assert!(engine.store().latest_per_symbol().is_empty());
    assert!(engine.store().full_history().is_empty());
}

#[test]
fn latest_view_holds_most_recent_merge() {
    let engine = MergeEngine::new();
    for (i, price) in [10.0, 11.0, 12.0].into_iter().enumerate() {
        engine.ingest(primary("AAPL", price), i as u64);
    }
    engine.ingest(primary("MSFT", 300.0), 5);

    let latest = engine.store().latest_per_symbol();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].price, Some(12.0));
    assert_eq!(engine.store().full_history()[0].symbol, "MSFT");
}

#[test]
fn snapshot_round_trip_reproduces_state() {
    let engine = MergeEngine::new();
    engine.ingest(octo("AAPL", 72.0, 68.0), 0);
    engine.ingest(
        Payload::from_value(json!({"symbol": "AAPL", "cciSignal": "up", "cci": 110})),
        0,
    );
    engine.ingest(primary("AAPL", 190.0), MINUTE_MS);

    let json = engine.snapshot(2 * MINUTE_MS).to_json().unwrap();
    let restored = MergeEngine::new();
    restored.restore(EngineSnapshot::from_json(&json).unwrap());

    assert_eq!(
        restored.store().latest_per_symbol(),
        engine.store().latest_per_symbol()
    );
    assert_eq!(restored.previous_trend("AAPL"), engine.previous_trend("AAPL"));
    assert_eq!(restored.snapshot(0).side_channels, engine.snapshot(0).side_channels);
    assert_eq!(restored.snapshot(0).patterns, engine.snapshot(0).patterns);

    // crossing state survives: the next sample is diffed against the restored one
    let a = engine.ingest(octo("AAPL", 40.0, 68.0), 3 * MINUTE_MS).record.unwrap();
    let b = restored.ingest(octo("AAPL", 40.0, 68.0), 3 * MINUTE_MS).record.unwrap();
    assert_eq!(a.oscillator, b.oscillator);
}

fn quad(symbol: &str, d2: f64) -> Payload {
    Payload::from_value(json!({
        "symbol": symbol, "quadStoch": "cross", "d1": 30, "d2": d2,
        "d1Direction": "down", "d2Direction": "down"
    }))
}

#[test]
fn valid_quad_reading_fires_extreme_on_octo_update() {
    let engine = MergeEngine::new();
    engine.ingest(quad("TSLA", 15.0), 0);

    let out = engine.ingest(octo("TSLA", 40.0, 45.0), 5 * MINUTE_MS);
    let n = out.notification.expect("quad d2 still inside its window");
    assert_eq!(n.trigger, NotificationTrigger::Extreme);
    assert_eq!(n.value, 15.0);
}

#[test]
fn expired_quad_reading_is_dropped_by_later_side_update() {
    let engine = MergeEngine::new();
    engine.ingest(quad("TSLA", 15.0), 0);

    let out = engine.ingest(octo("TSLA", 40.0, 45.0), 30 * MINUTE_MS);
    let rec = out.record.unwrap();
    assert!(rec.quad.is_none());
    assert!(out.notification.is_none());

    let latest = engine.store().latest("TSLA").unwrap();
    assert!(latest.quad.is_none());
    assert!(engine.side_channels().quad.is_empty());
}

#[test]
fn expired_octo_stops_driving_trend_on_later_side_update() {
    let engine = MergeEngine::new();
    let first = engine.ingest(octo("AAPL", 72.0, 92.0), 0).record.unwrap();
    assert_eq!(first.calculated_trend, TrendLabel::DeadLong);

    let later = engine
        .ingest(
            Payload::from_value(json!({"symbol": "AAPL", "cciSignal": "up", "cci": 110})),
            180 * MINUTE_MS,
        )
        .record
        .unwrap();
    assert!(later.oscillator.is_none());
    assert_eq!(later.calculated_trend, TrendLabel::Neutral);
    assert_eq!(
        engine.store().latest("AAPL").unwrap().calculated_trend,
        TrendLabel::Neutral
    );

    let merged = engine
        .ingest(primary("AAPL", 1.0), 180 * MINUTE_MS + 1)
        .record
        .unwrap();
    assert_eq!(merged.calculated_trend, later.calculated_trend);
    assert_eq!(merged.cci, later.cci);
}

#[test]
fn day_change_back_fill_stops_after_an_hour() {
    let engine = MergeEngine::new();
    engine.ingest(
        Payload::from_value(json!({"symbol": "AAPL", "changeFromPrevDay": 2.5, "volume": 1200})),
        0,
    );

    let within = engine.ingest(primary("AAPL", 1.0), 59 * MINUTE_MS).record.unwrap();
    assert_eq!(within.change_from_prev_day, Some(2.5));
    assert_eq!(within.volume, Some(1200.0));

    let after = engine.ingest(primary("AAPL", 1.0), 61 * MINUTE_MS).record.unwrap();
    assert_eq!(after.change_from_prev_day, None);
    assert_eq!(after.volume, None);
    assert!(engine.side_channels().day_change.is_empty());
}
