pub mod client;
pub mod errors;
pub mod refresher;

pub use client::HttpSectorProvider;
pub use errors::SectorError;
pub use refresher::{refresh_once, run_sector_refresher};

use async_trait::async_trait;

#[async_trait]
pub trait SectorProvider: Send + Sync + 'static {
    /// `Ok(None)` when the provider knows the symbol but has no sector.
    async fn sector_for(&self, symbol: &str) -> Result<Option<String>, SectorError>;
}
