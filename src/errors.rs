//! Error types for httpoll

use thiserror::Error;

/// Main error type for httpoll
#[derive(Error, Debug)]
pub enum HttpollError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Config error: {0}")]
    Config(String),

    /// The operation was aborted through its cancellation source. The
    /// payload is the message passed to `cancel`, or the default
    /// "Request cancelled".
    #[error("{0}")]
    Cancelled(String),
}

impl HttpollError {
    /// Whether this failure is a cancellation rather than a genuine error.
    ///
    /// Failure handlers are expected to check this before treating a
    /// rejection as a transport problem.
    pub fn is_cancel(&self) -> bool {
        matches!(self, HttpollError::Cancelled(_))
    }
}

/// Classify a failure as a cancellation signal.
pub fn is_cancel(err: &HttpollError) -> bool {
    err.is_cancel()
}

pub type Result<T> = std::result::Result<T, HttpollError>;
