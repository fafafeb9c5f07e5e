//! Error types for Fisc

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not determine key data: {0}")]
    ModelOutputInvalid(String),

    #[error("Service temporarily unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Access denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Store pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Network failures and timeouts against the generative backend are
// transient from the caller's point of view.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::ModelUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
