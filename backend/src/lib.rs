pub mod api;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod persistence;
pub mod sector;

pub mod error;
