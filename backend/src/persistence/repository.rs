use anyhow::Result;
use async_trait::async_trait;

use signal_engine::EngineSnapshot;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Replaces the stored snapshot.
    async fn save(&self, snapshot: &EngineSnapshot) -> Result<()>;

    async fn load_latest(&self) -> Result<Option<EngineSnapshot>>;
}

#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<String>>;

    async fn star(&self, symbol: &str, now_ms: u64) -> Result<()>;

    async fn unstar(&self, symbol: &str) -> Result<()>;
}
