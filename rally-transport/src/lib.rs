//! Transport layer for the Rally XML webservice.
//!
//! - [`Transport`] — the three-verb contract the resource layer depends on
//! - [`HttpTransport`] — blocking HTTP with basic auth, gzip and the
//!   integration headers
//! - [`RetryingTransport`] — re-sends timed-out requests per [`RetryPolicy`]
//! - [`check_response`] — turns 401s and `<Errors>` payloads into errors
//! - [`mock::MockTransport`] — canned responses for tests

mod check;
mod error;
mod headers;
mod http;
mod retry;
mod transport;

pub use check::{check_response, error_payload};
pub use error::{TransportError, TransportResult};
pub use headers::{HEADER_PREFIX, IntegrationHeaders};
pub use http::{HttpConfig, HttpTransport};
pub use retry::{RetryPolicy, RetryingTransport};
pub use transport::{Method, Transport, mock};
