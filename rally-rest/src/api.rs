//! The API client.

use crate::config::{ClientConfig, CollectionPolicy};
use crate::error::RallyResult;
use crate::query_result::QueryResult;
use crate::resource::Resource;
use crate::session::Session;
use crate::typedef::TypeDefinitionCache;
use crate::value::Attributes;
use rally_query::{Group, Query, QueryBuilder};
use rally_transport::{HttpTransport, RetryingTransport, Transport};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Entry point: one authenticated user against one webservice version.
///
/// Cheap to clone; clones share the transport and the type definition
/// cache. Not `Send`: resources read through a client stay on its thread.
#[derive(Clone)]
pub struct RallyClient {
    session: Rc<Session>,
    types: Rc<TypeDefinitionCache>,
}

impl RallyClient {
    /// Builds a client over HTTP, wrapped in a timeout retry when the
    /// config asks for one. Does not contact the server.
    pub fn new(config: ClientConfig) -> RallyResult<Self> {
        let http = HttpTransport::new(&config.username, &config.password, &config.transport)?;
        let transport: Box<dyn Transport> = match config.retry {
            Some(policy) => Box::new(RetryingTransport::new(http, policy)),
            None => Box::new(http),
        };
        Ok(Self::with_transport(config, transport))
    }

    /// Builds a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let types = Rc::new(TypeDefinitionCache::new());
        let session = Rc::new(Session::new(
            config,
            Box::new(transport),
            Rc::downgrade(&types),
        ));
        Self { session, types }
    }

    /// Builds an HTTP client and checks the credentials by reading the
    /// current user.
    pub fn connect(config: ClientConfig) -> RallyResult<Self> {
        let client = Self::new(config)?;
        client.user()?;
        Ok(client)
    }

    pub(crate) fn session(&self) -> &Rc<Session> {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    pub fn base_url(&self) -> &str {
        &self.config().base_url
    }

    pub fn version(&self) -> &str {
        &self.config().version
    }

    pub fn collection_policy(&self) -> CollectionPolicy {
        self.session.policy()
    }

    /// Type definitions read through this client.
    pub fn type_definitions(&self) -> &TypeDefinitionCache {
        &self.types
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config().webservice_url())
    }

    /// The logged-in user.
    pub fn user(&self) -> RallyResult<Resource> {
        let url = self.url("user");
        debug!(%url, "Reading current user");
        let document = self.session.read(&url)?;
        Ok(Resource::from_element(Some(Rc::clone(&self.session)), document, None))
    }

    /// A lazy handle on the resource at `ref_url`. Nothing is read until an
    /// attribute is asked for.
    pub fn reference(&self, ref_url: &str) -> Resource {
        let stub = crate::xml::Element::new("Object").with_attribute("ref", ref_url);
        Resource::from_element(Some(Rc::clone(&self.session)), stub, None)
    }

    /// Parses a resource document with this client attached.
    pub fn from_xml(&self, xml: &str) -> RallyResult<Resource> {
        Resource::from_xml(Some(self), xml)
    }

    /// An unsaved resource of `resource_type`, bound to this client. Set
    /// attributes and call [`Resource::save`].
    pub fn new_resource(&self, resource_type: impl Into<String>) -> Resource {
        let resource = Resource::detached(Rc::clone(&self.session));
        resource.set_type(resource_type);
        resource
    }

    /// Creates a resource of `resource_type` (a snake_case symbol such as
    /// `test_case`) with the given values.
    pub fn create(&self, resource_type: &str, values: &Attributes) -> RallyResult<Resource> {
        let object = self.session.create(resource_type, values)?;
        Ok(Resource::from_element(Some(Rc::clone(&self.session)), object, None))
    }

    /// Runs a query and returns its first page.
    pub fn query(&self, query: &Query) -> RallyResult<QueryResult> {
        self.session.query(query)
    }

    /// Queries `resource_type` with a filter. `options` sets paging,
    /// ordering, fetch and scoping on the query builder.
    ///
    /// ```no_run
    /// # use rally_rest::{ClientConfig, RallyClient};
    /// # fn main() -> Result<(), rally_rest::RallyError> {
    /// let client = RallyClient::connect(ClientConfig::new("user@example.com", "secret"))?;
    /// let defects = client.find(
    ///     "defect",
    ///     |q| q.page_size(50).fetch(true),
    ///     |q| {
    ///         q.equal("state", "Open");
    ///     },
    /// )?;
    /// for defect in defects {
    ///     println!("{}", defect?);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn find(
        &self,
        resource_type: &str,
        options: impl FnOnce(QueryBuilder) -> QueryBuilder,
        predicate: impl FnOnce(&mut Group),
    ) -> RallyResult<QueryResult> {
        let query = options(Query::builder(resource_type))
            .filter(predicate)
            .build()?;
        self.query(&query)
    }

    /// Every resource of `resource_type`, i.e. those with `ObjectID > 0`.
    pub fn find_all(
        &self,
        resource_type: &str,
        options: impl FnOnce(QueryBuilder) -> QueryBuilder,
    ) -> RallyResult<QueryResult> {
        self.find(resource_type, options, |q| {
            q.gt("object_i_d", "0");
        })
    }

    pub fn update(&self, resource: &Resource, values: Attributes) -> RallyResult<()> {
        resource.update(values)
    }

    pub fn delete(&self, resource: &Resource) -> RallyResult<()> {
        resource.delete()
    }
}

impl fmt::Debug for RallyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config();
        f.debug_struct("RallyClient")
            .field("username", &config.username)
            .field("base_url", &config.base_url)
            .field("version", &config.version)
            .field("collection_policy", &config.collection_policy)
            .field("cached_type_definitions", &self.types.len())
            .finish()
    }
}
