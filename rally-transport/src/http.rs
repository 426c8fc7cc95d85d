//! HTTP transport on a blocking reqwest client.

use crate::check::check_response;
use crate::error::{TransportError, TransportResult};
use crate::headers::IntegrationHeaders;
use crate::transport::{Method, Transport};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Keep a cookie jar across requests.
    pub use_cookies: bool,
    /// Skip TLS certificate verification. Only for test servers.
    pub accept_invalid_certs: bool,
    pub headers: IntegrationHeaders,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            use_cookies: false,
            accept_invalid_certs: false,
            headers: IntegrationHeaders::default(),
        }
    }
}

/// Transport that sends every request with basic authentication.
///
/// Proxies configured through the standard `HTTP(S)_PROXY` environment
/// variables are honored by the underlying client.
pub struct HttpTransport {
    client: Client,
    username: String,
    password: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Builds the HTTP client.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        config: &HttpConfig,
    ) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(config.headers.header_map()?)
            .gzip(true)
            .deflate(true)
            .cookie_store(config.use_cookies)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Client(format!("http client: {e}")))?;

        Ok(Self {
            client,
            username: username.into(),
            password: password.into(),
        })
    }

    /// The user the transport authenticates as.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn send(&self, method: Method, url: &str, body: Option<&str>) -> TransportResult<String> {
        debug!(%method, url, "Sending request");

        let verb = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut request = self
            .client
            .request(verb, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/xml");
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        debug!(%method, url, status, bytes = text.len(), "Received response");

        check_response(status, &text)?;
        Ok(text)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> TransportResult<String> {
        self.send(Method::Get, url, None)
    }

    fn post(&self, url: &str, body: &str) -> TransportResult<String> {
        self.send(Method::Post, url, Some(body))
    }

    fn delete(&self, url: &str) -> TransportResult<String> {
        self.send(Method::Delete, url, None)
    }
}
