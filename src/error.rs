// Error types for the request gateway.
// Covers transport failures, HTTP status errors, decoding, and store access.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: StatusCode,
        url: String,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Whether the request gave up because the timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Transport(e) if e.is_timeout())
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
