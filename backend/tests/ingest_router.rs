use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use signal_engine::{MergeEngine, Payload, TrendLabel};
use signal_hub::broadcast::Broadcaster;
use signal_hub::ingest::{IngestPipeline, IngestRouter};
use signal_hub::metrics::counters::Counters;
use signal_hub::notify::NotificationDispatcher;

fn pipeline(engine: Arc<MergeEngine>, counters: Counters) -> IngestPipeline {
    IngestPipeline::new(
        engine,
        NotificationDispatcher::new(vec![], Duration::from_secs(1), counters.clone()),
        Broadcaster::new(16),
        counters,
    )
}

fn octo(symbol: &str, fast: f64, slow: f64) -> Payload {
    Payload::from_value(json!({
        "symbol": symbol, "octoStoch": "update",
        "d1": fast, "d1Direction": "up",
        "d3": 50, "d3Direction": "up",
        "d4": 50, "d4Direction": "up",
        "d8": slow, "d8Direction": "up",
    }))
}

#[tokio::test]
async fn same_symbol_updates_merge_in_submission_order() {
    let engine = Arc::new(MergeEngine::new());
    let counters = Counters::default();
    let router = Arc::new(IngestRouter::new(pipeline(engine.clone(), counters.clone()), 4));
    let (handle, rx) = IngestRouter::channel(4);
    let task = tokio::spawn(router.run(rx));

    for i in 0..200 {
        for symbol in ["AAPL", "MSFT", "TSLA"] {
            let payload = Payload::from_value(json!({"symbol": symbol, "price": i as f64}));
            handle.submit(payload).await.unwrap();
        }
    }

    drop(handle);
    task.await.unwrap();

    for symbol in ["AAPL", "MSFT", "TSLA"] {
        let prices: Vec<f64> = engine
            .store()
            .full_history()
            .iter()
            .filter(|r| r.symbol == symbol)
            .filter_map(|r| r.price)
            .collect();
        let expected: Vec<f64> = (0..200).rev().map(|i| i as f64).collect();
        assert_eq!(prices, expected, "{symbol} merged out of order");
    }
    assert_eq!(counters.view().ingested, 600);
}

#[tokio::test]
async fn octo_sequence_through_router_reaches_dead_long() {
    let engine = Arc::new(MergeEngine::new());
    let router = Arc::new(IngestRouter::new(pipeline(engine.clone(), Counters::default()), 8));
    let (handle, rx) = IngestRouter::channel(8);
    let task = tokio::spawn(router.run(rx));

    handle.submit(octo("AAPL", 72.0, 68.0)).await.unwrap();
    handle.submit(octo("AAPL", 72.0, 92.0)).await.unwrap();

    drop(handle);
    task.await.unwrap();

    assert_eq!(engine.previous_trend("AAPL"), Some(TrendLabel::DeadLong));
}

#[tokio::test]
async fn updates_without_symbol_still_reach_raw_history() {
    let engine = Arc::new(MergeEngine::new());
    let counters = Counters::default();
    let router = Arc::new(IngestRouter::new(pipeline(engine.clone(), counters.clone()), 8));
    let (handle, rx) = IngestRouter::channel(8);
    let task = tokio::spawn(router.run(rx));

    handle
        .submit(Payload::from_value(json!({"price": 1.0})))
        .await
        .unwrap();
    handle
        .submit(Payload::from_value(json!({"symbol": "   "})))
        .await
        .unwrap();

    drop(handle);
    task.await.unwrap();

    assert_eq!(engine.store().raw_history().len(), 2);
    assert!(engine.store().latest_per_symbol().is_empty());
    assert_eq!(counters.view().ignored, 2);
}
