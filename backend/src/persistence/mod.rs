pub mod repository;
pub mod repository_sqlx;
pub mod snapshotter;

pub use repository::{SnapshotRepository, WatchlistRepository};
pub use repository_sqlx::{SqlxSnapshotRepository, SqlxWatchlistRepository};
pub use snapshotter::Snapshotter;
