use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("update has no usable symbol")]
    MissingSymbol,

    #[error("unknown ORB session type: {0}")]
    UnknownOrbSession(String),

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}
