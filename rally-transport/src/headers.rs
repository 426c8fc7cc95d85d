//! Integration identification headers.
//!
//! Every request carries a set of `X-RallyIntegration*` headers naming the
//! integration, its vendor and version, the client library, the language
//! platform and the operating system.

use crate::error::{TransportError, TransportResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Prefix shared by every integration header.
pub const HEADER_PREFIX: &str = "X-RallyIntegration";

/// Values sent in the integration headers. Unset optional fields are
/// omitted from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationHeaders {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub library: String,
    pub platform: String,
    pub os: String,
}

impl Default for IntegrationHeaders {
    fn default() -> Self {
        Self {
            name: None,
            vendor: None,
            version: None,
            library: format!("rally-rest version {}", env!("CARGO_PKG_VERSION")),
            platform: "Rust".to_string(),
            os: format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
        }
    }
}

impl IntegrationHeaders {
    /// Sets the integration name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Header name/value pairs in a fixed order: name, vendor, version,
    /// library, platform, os.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let fields = [
            ("Name", self.name.as_deref()),
            ("Vendor", self.vendor.as_deref()),
            ("Version", self.version.as_deref()),
            ("Library", Some(self.library.as_str())),
            ("Platform", Some(self.platform.as_str())),
            ("Os", Some(self.os.as_str())),
        ];
        fields
            .into_iter()
            .filter_map(|(suffix, value)| {
                value.map(|v| (format!("{HEADER_PREFIX}{suffix}"), v.to_string()))
            })
            .collect()
    }

    /// Builds the header map sent with every request.
    pub fn header_map(&self) -> TransportResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.pairs() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Client(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| TransportError::Client(format!("header {name}: {e}")))?;
            map.insert(header, value);
        }
        Ok(map)
    }
}
