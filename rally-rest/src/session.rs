//! Connection state shared by a client and every resource read through it.

use crate::config::{ClientConfig, CollectionPolicy};
use crate::error::{RallyError, RallyResult};
use crate::payload::create_payload;
use crate::query_result::QueryResult;
use crate::typedef::TypeDefinitionCache;
use crate::value::Attributes;
use crate::xml::Element;
use rally_query::Query;
use rally_query::names::camel_case_word;
use rally_transport::Transport;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// Resources hold the session strongly. The type definition cache is held
/// weakly: cached definitions are resources themselves, and the client owns
/// the cache.
pub(crate) struct Session {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    types: Weak<TypeDefinitionCache>,
}

impl Session {
    pub fn new(
        config: ClientConfig,
        transport: Box<dyn Transport>,
        types: Weak<TypeDefinitionCache>,
    ) -> Self {
        Self {
            config,
            transport,
            types,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn policy(&self) -> CollectionPolicy {
        self.config.collection_policy
    }

    pub fn types(&self) -> RallyResult<Rc<TypeDefinitionCache>> {
        self.types
            .upgrade()
            .ok_or_else(|| RallyError::InvalidState("client has been dropped".to_string()))
    }

    pub fn read(&self, url: &str) -> RallyResult<Element> {
        let body = self.transport.get(url)?;
        Element::parse(&body)
    }

    pub fn post(&self, url: &str, payload: &str) -> RallyResult<Element> {
        let body = self.transport.post(url, payload)?;
        Element::parse(&body)
    }

    pub fn delete(&self, url: &str) -> RallyResult<()> {
        self.transport.delete(url)?;
        Ok(())
    }

    /// Posts a create request and returns the created `Object` element.
    pub fn create(&self, resource_type: &str, values: &Attributes) -> RallyResult<Element> {
        let wire_type = camel_case_word(resource_type);
        let url = format!("{}/{wire_type}/create", self.config.webservice_url());
        let payload = create_payload(resource_type, values)?;

        let response = self.post(&url, &payload)?;
        let object = response.child("Object").cloned().ok_or_else(|| {
            RallyError::MalformedResponse(format!(
                "create response for {wire_type} has no Object element"
            ))
        })?;
        info!(
            resource_type = %wire_type,
            reference = object.attribute("ref").unwrap_or_default(),
            "Created resource"
        );
        Ok(object)
    }

    pub fn query(self: &Rc<Self>, query: &Query) -> RallyResult<QueryResult> {
        let url = format!(
            "{}/{}?{}",
            self.config.webservice_url(),
            query.wire_type(),
            query.encoded()
        );
        debug!(%url, "Running query");
        let document = self.read(&url)?;
        QueryResult::from_document(Rc::clone(self), query.clone(), &document)
    }
}
