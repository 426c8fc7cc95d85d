//! Error types for the resource layer.

use rally_query::QueryError;
use rally_transport::TransportError;
use thiserror::Error;

/// Result type for resource operations.
pub type RallyResult<T> = Result<T, RallyError>;

/// Errors surfaced by resources, query results and the client.
///
/// A missing attribute is not an error: lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum RallyError {
    /// The server rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server answered with an `<Errors>` payload, kept verbatim.
    #[error("remote error: {0}")]
    Remote(String),

    /// Local misuse, such as saving a resource without a type.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Timeouts, connection failures and unexpected statuses.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The query could not be built.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// The body was not well-formed XML.
    #[error("xml error: {0}")]
    Xml(String),

    /// The XML was well-formed but not shaped as expected.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<TransportError> for RallyError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Unauthorized => RallyError::Authentication(e.to_string()),
            TransportError::Remote(errors) => RallyError::Remote(errors),
            other => RallyError::Transport(other),
        }
    }
}

impl From<quick_xml::Error> for RallyError {
    fn from(e: quick_xml::Error) -> Self {
        RallyError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for RallyError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        RallyError::Xml(e.to_string())
    }
}
