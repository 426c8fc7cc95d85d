//! Object mapping over the Rally XML webservice.
//!
//! A [`RallyClient`] runs queries and creates resources. Every object read
//! comes back as a [`Resource`]: a proxy over its XML document that reads
//! referenced objects on first access, records local edits and writes them
//! back on [`Resource::save`] or [`Resource::update`]. Query responses are
//! [`QueryResult`] pages that iterate across the whole result set.
//! [`TypeDefinition`]s describe the schema and are cached per client.
//!
//! All calls block. Resources and clients are single-threaded (`!Send`).
//!
//! # Example
//!
//! ```
//! use rally_rest::{AttributeValue, ClientConfig, CollectionPolicy, RallyClient};
//! use rally_transport::mock::MockTransport;
//!
//! let transport = MockTransport::new();
//! transport.on_get(
//!     "https://rally1.rallydev.com/slm/webservice/1.36/defect/7",
//!     r#"<Defect ref="https://rally1.rallydev.com/slm/webservice/1.36/defect/7">
//!          <Name>Login fails</Name>
//!        </Defect>"#,
//! );
//!
//! let client = RallyClient::with_transport(ClientConfig::default(), transport);
//! let defect = client.reference("https://rally1.rallydev.com/slm/webservice/1.36/defect/7");
//! assert_eq!(
//!     defect.get("name").unwrap(),
//!     Some(AttributeValue::from("Login fails"))
//! );
//! assert_eq!(client.collection_policy(), CollectionPolicy::Flat);
//! ```

mod api;
mod config;
mod error;
mod parse;
mod payload;
mod query_result;
mod resource;
mod session;
mod typedef;
mod value;
mod xml;

pub use api::RallyClient;
pub use config::{ClientConfig, CollectionPolicy};
pub use error::{RallyError, RallyResult};
pub use parse::{NodeKind, classify};
pub use payload::{COLLECTION_ATTRIBUTES, create_payload, update_payload};
pub use query_result::{Pages, QueryResult, more_pages};
pub use resource::Resource;
pub use typedef::{AttributeDefinition, AttributeDefinitions, TypeDefinition, TypeDefinitionCache};
pub use value::{AttributeValue, Attributes};
pub use xml::Element;

pub use rally_query::{Query, QueryBuilder};
pub use rally_transport::{HttpConfig, IntegrationHeaders, RetryPolicy};
