use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{SectorError, SectorProvider};

#[derive(Debug, Deserialize)]
struct SectorEnvelope {
    sector: Option<String>,
}

/// Looks sectors up at `GET {url}/{symbol}`, expecting `{"sector": "..."}`.
#[derive(Clone)]
pub struct HttpSectorProvider {
    http: Client,
    url: String,
}

impl HttpSectorProvider {
    pub fn new(url: String) -> Result<Self, SectorError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SectorProvider for HttpSectorProvider {
    #[instrument(skip(self), level = "debug")]
    async fn sector_for(&self, symbol: &str) -> Result<Option<String>, SectorError> {
        let url = format!("{}/{}", self.url, symbol);

        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: SectorEnvelope = resp
            .error_for_status()?
            .json()
            .await
            .map_err(|_| SectorError::InvalidResponse)?;

        let sector = envelope
            .sector
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        debug!(?sector, "sector fetched");
        Ok(sector)
    }
}
