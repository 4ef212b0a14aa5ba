//! Notification transports and fire-and-forget dispatch.
//!
//! Each transport is independent: one failing or hanging never delays the
//! other, and never reaches back into the engine.

pub mod discord;
pub mod email;
pub mod errors;

pub use discord::DiscordNotifier;
pub use email::EmailNotifier;
pub use errors::NotifyError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, info, warn};

use signal_engine::{NotificationTrigger, TrendNotification};

use crate::metrics::counters::{Counters, bump};

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn notify(&self, n: &TrendNotification) -> Result<(), NotifyError>;
}

/// Subject line and body shared by every transport.
pub fn render(n: &TrendNotification) -> (String, String) {
    let old = n
        .old_trend
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    let price = n
        .price
        .map(|p| format!("{p:.2}"))
        .unwrap_or_else(|| "n/a".to_string());

    let subject = match n.trigger {
        NotificationTrigger::Extreme => format!("{}: {}", n.symbol, n.new_trend),
        NotificationTrigger::TrendChange => format!("{}: {} -> {}", n.symbol, old, n.new_trend),
    };
    let body = format!(
        "{}\nprice: {}\noscillator: {:.1}\nprevious trend: {}",
        subject, price, n.value, old
    );
    (subject, body)
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    timeout: Duration,
    counters: Counters,
}

impl NotificationDispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>, timeout: Duration, counters: Counters) -> Self {
        Self {
            notifiers,
            timeout,
            counters,
        }
    }

    pub fn transports(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Spawns one send per transport and returns immediately. Failures and
    /// timeouts are logged and dropped; there is no redelivery.
    pub fn dispatch(&self, n: TrendNotification) -> Vec<JoinHandle<()>> {
        let n = Arc::new(n);

        self.notifiers
            .iter()
            .map(|notifier| {
                let notifier = Arc::clone(notifier);
                let n = Arc::clone(&n);
                let limit = self.timeout;
                let counters = self.counters.clone();

                tokio::spawn(
                    async move {
                        let transport = notifier.name();
                        match timeout(limit, notifier.notify(&n)).await {
                            Ok(Ok(())) => {
                                info!(transport, symbol = %n.symbol, trigger = %n.trigger, "notification sent");
                            }
                            Ok(Err(e)) => {
                                bump(&counters.notify_failures);
                                warn!(transport, symbol = %n.symbol, error = %e, "notification failed");
                            }
                            Err(_) => {
                                bump(&counters.notify_failures);
                                warn!(
                                    transport,
                                    symbol = %n.symbol,
                                    timeout_ms = limit.as_millis() as u64,
                                    "notification timed out"
                                );
                            }
                        }
                    }
                    .in_current_span(),
                )
            })
            .collect()
    }
}
