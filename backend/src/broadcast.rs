use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BroadcastEvent {
    pub event: &'static str,
    pub data: Value,
}

/// Fan-out of merge results to live subscribers. Publishing never blocks
/// and never fails the caller.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<BroadcastEvent>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish<T: Serialize>(&self, event: &'static str, data: &T) {
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!(event, error = %e, "broadcast payload not serializable");
                return;
            }
        };
        // Err only means nobody is listening.
        let _ = self.tx.send(BroadcastEvent { event, data });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
