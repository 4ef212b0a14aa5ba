use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::instrument;

use signal_engine::TrendNotification;

use super::{Notifier, NotifyError, render};

#[derive(Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Posts notifications to a Discord channel webhook.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, webhook_url })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    #[instrument(skip_all, fields(symbol = %n.symbol), level = "debug")]
    async fn notify(&self, n: &TrendNotification) -> Result<(), NotifyError> {
        let (_, body) = render(n);
        let msg = WebhookMessage { content: &body };

        self.http
            .post(&self.webhook_url)
            .json(&msg)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
