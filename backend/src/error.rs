use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("ingest queue closed")]
    IngestClosed,

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] anyhow::Error),
}
