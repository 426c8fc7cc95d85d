//! Error types for query construction.

use thiserror::Error;

/// Result type for query operations.
pub type BuildResult<T> = Result<T, QueryError>;

/// Errors raised while building a query. These are configuration mistakes,
/// reported before anything reaches the transport.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The `fetch` parameter rendered to something other than `true`/`false`.
    #[error("value for fetch must be either true or false, got {0:?}")]
    InvalidFetch(String),

    /// No resource type was given.
    #[error("query requires a resource type")]
    EmptyType,
}
