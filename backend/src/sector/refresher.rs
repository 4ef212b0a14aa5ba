//! Out-of-band sector refresh.
//!
//! The engine queues symbols whose sector is missing or stale; this loop
//! drains that queue against the provider. Failed lookups are not recorded,
//! so the next update for the symbol queues it again.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use common::time::now_ms;
use signal_engine::MergeEngine;

use crate::metrics::counters::{Counters, bump};
use crate::sector::SectorProvider;

/// Resolves every queued symbol once. Returns how many lookups succeeded.
pub async fn refresh_once<P: SectorProvider + ?Sized>(
    engine: &MergeEngine,
    provider: &P,
    counters: &Counters,
) -> usize {
    let mut resolved = 0;

    for symbol in engine.sectors().take_pending() {
        bump(&counters.sector_lookups);
        match provider.sector_for(&symbol).await {
            Ok(sector) => {
                engine.sectors().record(&symbol, sector, now_ms());
                resolved += 1;
            }
            Err(e) => {
                bump(&counters.sector_failures);
                warn!(symbol = %symbol, error = %e, "sector lookup failed");
            }
        }
    }

    resolved
}

pub async fn run_sector_refresher(
    engine: Arc<MergeEngine>,
    provider: Arc<dyn SectorProvider>,
    every: Duration,
    counters: Counters,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_ms = every.as_millis() as u64, "sector refresher started");

    loop {
        ticker.tick().await;
        refresh_once(engine.as_ref(), provider.as_ref(), &counters).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::SectorError;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl SectorProvider for Fixed {
        async fn sector_for(&self, symbol: &str) -> Result<Option<String>, SectorError> {
            match symbol {
                "AAPL" => Ok(Some("Technology".into())),
                "DOWN" => Err(SectorError::InvalidResponse),
                _ => Ok(None),
            }
        }
    }

    #[tokio::test]
    async fn resolves_queue_and_requeues_failures() {
        let engine = MergeEngine::new();
        let counters = Counters::default();
        let now = now_ms();

        engine.sectors().lookup("AAPL", now);
        engine.sectors().lookup("DOWN", now);

        assert_eq!(refresh_once(&engine, &Fixed, &counters).await, 1);
        assert_eq!(engine.sectors().lookup("AAPL", now), Some("Technology".into()));
        assert_eq!(counters.view().sector_failures, 1);

        // the failed symbol is queued again by its next lookup
        engine.sectors().lookup("DOWN", now);
        assert_eq!(engine.sectors().take_pending(), vec!["DOWN"]);
    }
}
