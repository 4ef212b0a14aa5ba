use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport rejected message: {0}")]
    Rejected(String),
}
