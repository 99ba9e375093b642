//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered outside the 2xx range. Logging and coverage
    /// side effects for the call have already run when this is raised.
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid header value for '{0}'")]
    InvalidHeaderValue(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Coverage recording error: {0}")]
    Recording(String),
}

impl HttpError {
    /// Status code carried by a `Status` error, if that is what this is
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
