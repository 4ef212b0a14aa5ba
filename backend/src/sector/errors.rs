use thiserror::Error;

#[derive(Error, Debug)]
pub enum SectorError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from sector api")]
    InvalidResponse,
}
