use std::str::FromStr;
use std::time::Duration;

/// Credentials and addressing for the HTTP email API transport.
#[derive(Clone, Debug, PartialEq)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Address the HTTP surface binds to.
    pub http_addr: String,

    /// JSON logs when running in production.
    pub production: bool,

    // =========================
    // Ingestion
    // =========================
    /// Capacity of the channel between the HTTP handler and the router.
    ///
    /// Acts as backpressure: a slow engine makes the webhook handler wait
    /// instead of growing memory without bound.
    pub ingest_queue_capacity: usize,

    /// Backlog allowed per symbol worker.
    pub per_symbol_queue_capacity: usize,

    // =========================
    // Background loops
    // =========================
    pub snapshot_interval: Duration,

    /// Sector lookups are disabled when unset.
    pub sector_api_url: Option<String>,
    pub sector_refresh_interval: Duration,

    /// Capacity of the live-update broadcast channel. Slow SSE subscribers
    /// skip events once they fall this far behind.
    pub broadcast_capacity: usize,

    // =========================
    // Notification transports
    // =========================
    /// Per-send timeout applied to every transport.
    pub notify_timeout: Duration,

    /// Discord transport is enabled when set.
    pub discord_webhook_url: Option<String>,

    /// Email transport is enabled when every `EMAIL_*` variable is set.
    pub email: Option<EmailConfig>,
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable numbers fall back
    /// to their defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = match (
            non_empty(get("EMAIL_API_URL")),
            non_empty(get("EMAIL_API_KEY")),
            non_empty(get("EMAIL_FROM")),
            non_empty(get("EMAIL_TO")),
        ) {
            (Some(api_url), Some(api_key), Some(from), Some(to)) => Some(EmailConfig {
                api_url,
                api_key,
                from,
                to: to
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            }),
            _ => None,
        };

        Self {
            database_url: non_empty(get("DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://signal_hub.db?mode=rwc".to_string()),
            http_addr: non_empty(get("HTTP_ADDR")).unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            production: get("APP_ENV").as_deref() == Some("production"),

            ingest_queue_capacity: parse_or(get("INGEST_QUEUE_CAPACITY"), 1_024),
            per_symbol_queue_capacity: parse_or(get("PER_SYMBOL_QUEUE_CAPACITY"), 64),

            snapshot_interval: Duration::from_secs(parse_or(get("SNAPSHOT_INTERVAL_SECS"), 60)),
            sector_api_url: non_empty(get("SECTOR_API_URL")),
            sector_refresh_interval: Duration::from_secs(parse_or(get("SECTOR_REFRESH_SECS"), 5)),
            broadcast_capacity: parse_or(get("BROADCAST_CAPACITY"), 256),

            notify_timeout: Duration::from_millis(parse_or(get("NOTIFY_TIMEOUT_MS"), 5_000)),
            discord_webhook_url: non_empty(get("DISCORD_WEBHOOK_URL")),
            email,
        }
    }
}
