use std::sync::Arc;

use tracing::debug;

use common::time::now_ms;
use signal_engine::{IngestOutcome, MergeEngine, Payload};

use crate::broadcast::Broadcaster;
use crate::metrics::counters::{Counters, bump};
use crate::notify::NotificationDispatcher;

/// One update, end to end: merge, broadcast, hand notifications to the
/// transports. Only the merge is synchronous; everything after it is
/// fire-and-forget.
#[derive(Clone)]
pub struct IngestPipeline {
    engine: Arc<MergeEngine>,
    dispatcher: NotificationDispatcher,
    broadcaster: Broadcaster,
    counters: Counters,
}

impl IngestPipeline {
    pub fn new(
        engine: Arc<MergeEngine>,
        dispatcher: NotificationDispatcher,
        broadcaster: Broadcaster,
        counters: Counters,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            broadcaster,
            counters,
        }
    }

    pub fn process(&self, payload: Payload) -> IngestOutcome {
        let outcome = self.engine.ingest(payload, now_ms());
        bump(&self.counters.ingested);

        match &outcome.record {
            Some(rec) => self.broadcaster.publish("alert", rec),
            None => bump(&self.counters.ignored),
        }

        if let Some(n) = &outcome.notification {
            bump(&self.counters.notifications);
            debug!(symbol = %n.symbol, trigger = %n.trigger, "dispatching notification");
            self.broadcaster.publish("notification", n);
            self.dispatcher.dispatch(n.clone());
        }

        outcome
    }
}
