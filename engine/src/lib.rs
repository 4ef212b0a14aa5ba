//! Per-symbol indicator stream aggregation.
//!
//! Partial updates from independent indicator producers are cached per
//! family, merged into one record per symbol, classified into a trend label
//! and edge-detected for notifications. Everything here is synchronous and
//! takes the current time as an argument.

pub mod big_trend;
pub mod cache;
pub mod error;
pub mod kind;
pub mod merge;
pub mod notify;
pub mod oscillator;
pub mod pattern;
pub mod payload;
pub mod projection;
pub mod record;
pub mod sector;
pub mod snapshot;
pub mod store;
pub mod trend;
pub mod watchlist;

pub use error::EngineError;
pub use kind::UpdateKind;
pub use merge::{IngestOutcome, MergeEngine};
pub use notify::{NotificationTrigger, TrendNotification};
pub use payload::Payload;
pub use record::{AlertRecord, TrendLabel};
pub use snapshot::EngineSnapshot;
pub use store::RawAlert;
