//! Client configuration.

use rally_transport::{HttpConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

/// How same-typed reference children of a collection element are exposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicy {
    /// An ordered list of the children.
    #[default]
    Flat,
    /// A map keyed by each child's `refObjectName`; repeated names collect
    /// into a list.
    Named,
}

/// Configuration for a [`RallyClient`](crate::RallyClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub username: String,
    pub password: String,
    /// Service root, e.g. `https://rally1.rallydev.com/slm`.
    pub base_url: String,
    /// Webservice API version.
    pub version: String,
    pub collection_policy: CollectionPolicy,
    pub transport: HttpConfig,
    /// Wraps the HTTP transport in a timeout retry when set.
    pub retry: Option<RetryPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            base_url: "https://rally1.rallydev.com/slm".to_string(),
            version: "1.36".to_string(),
            collection_policy: CollectionPolicy::default(),
            transport: HttpConfig::default(),
            retry: None,
        }
    }
}

impl ClientConfig {
    /// Config with credentials and every other field at its default.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Root of the versioned webservice: `<base_url>/webservice/<version>`.
    pub fn webservice_url(&self) -> String {
        format!(
            "{}/webservice/{}",
            self.base_url.trim_end_matches('/'),
            self.version
        )
    }
}

impl std::fmt::Display for CollectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CollectionPolicy::Flat => "flat",
            CollectionPolicy::Named => "named",
        })
    }
}
