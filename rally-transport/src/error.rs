//! Error types for the transport layer.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors surfaced by a transport call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered 401.
    #[error("Invalid Username or Password.")]
    Unauthorized,

    /// The response body carried a non-empty `<Errors>` element. Holds the
    /// raw element so callers see exactly what the server said.
    #[error("remote error: {0}")]
    Remote(String),

    /// Non-success status without a structured error payload.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or body decoding failure.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("invalid client configuration: {0}")]
    Client(String),
}

impl TransportError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }

    /// Returns true for authentication failures.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::Unauthorized)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_builder() {
            TransportError::Client(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}
