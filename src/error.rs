// Visitlog Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisitLogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("photo must be a data URL")]
    InvalidPhoto,

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for VisitLogError {
    fn from(err: anyhow::Error) -> Self {
        VisitLogError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VisitLogError>;
