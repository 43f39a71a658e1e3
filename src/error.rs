use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response; `message` comes from the body's `message` field when present.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("notification dispatch failed: {0}")]
    Notification(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}
