use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP {status} for url: {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Invalid photo count: {0}")]
    Validation(String),

    #[error("Photo listing unavailable: {0}")]
    ListingUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Worker process failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FetchError {
    /// Per-item failures are turned into error records instead of aborting a batch.
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. }
                | FetchError::Timeout { .. }
                | FetchError::HttpStatus { .. }
                | FetchError::MalformedResponse { .. }
                | FetchError::Worker(_)
        )
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Timeout { .. } => "timeout",
            FetchError::HttpStatus { .. } => "http_status",
            FetchError::MalformedResponse { .. } => "malformed_response",
            FetchError::Validation(_) => "validation",
            FetchError::ListingUnavailable(_) => "listing_unavailable",
            FetchError::Configuration(_) => "configuration",
            FetchError::Worker(_) => "worker",
            FetchError::Io(_) => "io",
            FetchError::Serialization(_) => "serialization",
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Serialization(err.to_string())
    }
}
