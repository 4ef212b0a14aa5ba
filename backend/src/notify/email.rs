use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::instrument;

use signal_engine::TrendNotification;

use super::{Notifier, NotifyError, render};
use crate::config::EmailConfig;

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Sends notifications through a transactional email HTTP API
/// (bearer-token JSON `POST`).
#[derive(Clone)]
pub struct EmailNotifier {
    http: Client,
    cfg: EmailConfig,
}

impl EmailNotifier {
    pub fn new(cfg: EmailConfig) -> Result<Self, NotifyError> {
        if cfg.to.is_empty() {
            return Err(NotifyError::Rejected("no email recipients configured".into()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, cfg })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    #[instrument(skip_all, fields(symbol = %n.symbol), level = "debug")]
    async fn notify(&self, n: &TrendNotification) -> Result<(), NotifyError> {
        let (subject, text) = render(n);
        let req = SendRequest {
            from: &self.cfg.from,
            to: &self.cfg.to,
            subject: &subject,
            text: &text,
        };

        self.http
            .post(&self.cfg.api_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
