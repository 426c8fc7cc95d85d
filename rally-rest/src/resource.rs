//! Resource proxy.
//!
//! A [`Resource`] wraps one XML document. A document that is only a
//! reference stub (a `ref` attribute, no children) is read from the server
//! the first time an attribute is asked for; the parse is then kept until
//! [`Resource::refresh`]. Locally set values are held as pending edits until
//! [`Resource::save`] or [`Resource::update`] sends them.
//!
//! Cloning a `Resource` yields another handle to the same instance. Use
//! [`Resource::duplicate`] for an independent copy.

use crate::api::RallyClient;
use crate::config::CollectionPolicy;
use crate::error::{RallyError, RallyResult};
use crate::parse::Parser;
use crate::payload::update_payload;
use crate::session::Session;
use crate::typedef::TypeDefinition;
use crate::value::{AttributeValue, Attributes};
use crate::xml::Element;
use rally_query::names::underscore;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use tracing::{debug, info};

/// Types that live outside a workspace and so have no type definition.
const UNTYPED: [&str; 3] = ["User", "Workspace", "Subscription"];

#[derive(Default)]
struct State {
    session: Option<Rc<Session>>,
    policy: Option<CollectionPolicy>,
    document: Option<Element>,
    /// `Some` once materialized.
    attributes: Option<Attributes>,
    pending: Attributes,
    type_override: Option<String>,
}

impl State {
    fn policy(&self) -> CollectionPolicy {
        self.policy
            .or_else(|| self.session.as_ref().map(|s| s.policy()))
            .unwrap_or_default()
    }

    fn parse(&self, element: &Element) -> Attributes {
        Parser {
            session: self.session.as_ref(),
            policy: self.policy(),
        }
        .attributes(element)
    }

    fn root_attribute(&self, key: &str) -> Option<String> {
        self.document
            .as_ref()
            .and_then(|d| d.attribute(key))
            .map(str::to_string)
    }

    fn ref_url(&self) -> Option<String> {
        self.root_attribute("ref")
    }

    fn resource_type(&self) -> Option<String> {
        self.type_override
            .clone()
            .or_else(|| self.root_attribute("type"))
            .or_else(|| self.document.as_ref().map(|d| d.name.clone()))
    }

    fn copy(&self, policy: Option<CollectionPolicy>) -> State {
        let mut copy = State {
            session: self.session.clone(),
            policy,
            document: self.document.clone(),
            attributes: None,
            pending: self.pending.clone(),
            type_override: self.type_override.clone(),
        };
        if self.attributes.is_some() {
            copy.attributes = match (&self.document, policy == self.policy) {
                (_, true) => self.attributes.clone(),
                (Some(document), false) => Some(copy.parse(document)),
                (None, false) => self.attributes.clone(),
            };
        }
        copy
    }
}

/// One remote object, lazily read.
#[derive(Clone)]
pub struct Resource {
    inner: Rc<RefCell<State>>,
}

impl Resource {
    /// A new, unsaved resource with no client. Set a type and a client
    /// before calling [`Resource::save`].
    pub fn new() -> Self {
        Self::from_state(State::default())
    }

    fn from_state(state: State) -> Self {
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    /// Wraps a parsed element. Stubs stay unmaterialized; anything else is
    /// parsed right away.
    pub(crate) fn from_element(
        session: Option<Rc<Session>>,
        element: Element,
        policy: Option<CollectionPolicy>,
    ) -> Self {
        let mut state = State {
            session,
            policy,
            ..Default::default()
        };
        if !element.is_reference_stub() {
            state.attributes = Some(state.parse(&element));
        }
        state.document = Some(element);
        Self::from_state(state)
    }

    pub(crate) fn detached(session: Rc<Session>) -> Self {
        Self::from_state(State {
            session: Some(session),
            ..Default::default()
        })
    }

    /// Parses a resource document. Without a client the resource can still
    /// be read, but references inside it cannot be followed.
    pub fn from_xml(client: Option<&RallyClient>, xml: &str) -> RallyResult<Self> {
        let element = Element::parse(xml)?;
        Ok(Self::from_element(
            client.map(|c| Rc::clone(c.session())),
            element,
            None,
        ))
    }

    pub(crate) fn session(&self) -> Option<Rc<Session>> {
        self.inner.borrow().session.clone()
    }

    /// Binds the resource to a client. Later reads and writes go through it.
    pub fn set_client(&self, client: &RallyClient) {
        self.inner.borrow_mut().session = Some(Rc::clone(client.session()));
    }

    pub fn has_client(&self) -> bool {
        self.inner.borrow().session.is_some()
    }

    /// The resource URI. `None` until the resource has been saved.
    pub fn ref_url(&self) -> Option<String> {
        self.inner.borrow().ref_url()
    }

    /// Display name: a pending `name` edit, else the document's
    /// `refObjectName`. Never triggers a read.
    pub fn name(&self) -> Option<String> {
        let state = self.inner.borrow();
        match state.pending.get("name") {
            Some(AttributeValue::Null) | None => state.root_attribute("refObjectName"),
            Some(value) => Some(value.to_string()),
        }
    }

    /// Type name: an explicit override, else the root's `type` attribute,
    /// else the root tag.
    pub fn resource_type(&self) -> Option<String> {
        self.inner.borrow().resource_type()
    }

    /// Overrides the type, e.g. before saving a new resource.
    pub fn set_type(&self, resource_type: impl Into<String>) {
        self.inner.borrow_mut().type_override = Some(resource_type.into());
    }

    /// The type as a snake_case symbol (`HierarchicalRequirement` becomes
    /// `hierarchical_requirement`).
    pub fn type_symbol(&self) -> Option<String> {
        self.resource_type().map(|t| underscore(&t))
    }

    /// True once the attribute mapping has been parsed.
    pub fn is_materialized(&self) -> bool {
        self.inner.borrow().attributes.is_some()
    }

    /// Looks up an attribute by its snake_case symbol.
    ///
    /// Pending edits win. Otherwise the resource is materialized (at most
    /// once) and the parsed value returned. `Ok(None)` means the document
    /// has no such element.
    pub fn get(&self, name: &str) -> RallyResult<Option<AttributeValue>> {
        if let Some(value) = self.inner.borrow().pending.get(name) {
            return Ok(Some(value.clone()));
        }
        self.materialize()?;
        Ok(self
            .inner
            .borrow()
            .attributes
            .as_ref()
            .and_then(|a| a.get(name))
            .cloned())
    }

    /// Text of an attribute, if it is a scalar.
    pub fn text(&self, name: &str) -> RallyResult<Option<String>> {
        Ok(self
            .get(name)?
            .and_then(|v| v.as_text().map(str::to_string)))
    }

    /// Looks up an attribute without reading from the server.
    pub fn cached(&self, name: &str) -> Option<AttributeValue> {
        let state = self.inner.borrow();
        state
            .pending
            .get(name)
            .or_else(|| state.attributes.as_ref().and_then(|a| a.get(name)))
            .cloned()
    }

    /// Every attribute, parsed values overlaid with pending edits.
    pub fn attributes(&self) -> RallyResult<Attributes> {
        self.materialize()?;
        let state = self.inner.borrow();
        let mut all = state.attributes.clone().unwrap_or_default();
        all.merge(&state.pending);
        Ok(all)
    }

    /// Records a pending edit. Nothing is sent until `save` or `update`.
    pub fn set(&self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.inner.borrow_mut().pending.insert(name, value);
    }

    /// Edits not yet sent.
    pub fn pending(&self) -> Attributes {
        self.inner.borrow().pending.clone()
    }

    /// The `ObjectID` value.
    pub fn oid(&self) -> RallyResult<Option<String>> {
        self.text("object_i_d")
    }

    /// The backing document as XML, if there is one.
    pub fn body(&self) -> RallyResult<Option<String>> {
        match &self.inner.borrow().document {
            Some(document) => document.to_xml().map(Some),
            None => Ok(None),
        }
    }

    fn materialize(&self) -> RallyResult<()> {
        let (session, url) = {
            let state = self.inner.borrow();
            if state.attributes.is_some() {
                return Ok(());
            }
            // Never saved: nothing to read.
            let Some(url) = state.ref_url() else {
                return Ok(());
            };
            let session = state.session.clone().ok_or_else(|| {
                RallyError::InvalidState(format!("cannot read {url}: missing client"))
            })?;
            (session, url)
        };
        self.load(&session, &url)
    }

    fn load(&self, session: &Session, url: &str) -> RallyResult<()> {
        debug!(reference = url, "Materializing resource");
        let mut document = session.read(url)?;

        let mut state = self.inner.borrow_mut();
        for key in ["ref", "refObjectName"] {
            if document.attribute(key).is_none() {
                if let Some(previous) = state.root_attribute(key) {
                    document.set_attribute(key, previous);
                }
            }
        }
        let attributes = state.parse(&document);
        state.attributes = Some(attributes);
        state.document = Some(document);
        Ok(())
    }

    fn bound(&self, action: &str) -> RallyResult<(Rc<Session>, String)> {
        let state = self.inner.borrow();
        let session = state
            .session
            .clone()
            .ok_or_else(|| RallyError::InvalidState(format!("cannot {action}: missing client")))?;
        let url = state.ref_url().ok_or_else(|| {
            RallyError::InvalidState(format!("cannot {action} a resource that was never saved"))
        })?;
        Ok((session, url))
    }

    /// Re-reads the resource. Pending edits survive.
    pub fn refresh(&self) -> RallyResult<()> {
        let (session, url) = self.bound("refresh")?;
        self.load(&session, &url)
    }

    /// Creates the resource on the server from its pending edits and
    /// replaces the backing document with the created object.
    pub fn save(&self) -> RallyResult<()> {
        let (session, resource_type, values) = {
            let state = self.inner.borrow();
            let session = state
                .session
                .clone()
                .ok_or_else(|| RallyError::InvalidState("missing client".to_string()))?;
            let resource_type = state
                .resource_type()
                .ok_or_else(|| RallyError::InvalidState("missing object type".to_string()))?;
            (session, resource_type, state.pending.clone())
        };

        let object = session.create(&resource_type, &values)?;

        let mut state = self.inner.borrow_mut();
        let attributes = state.parse(&object);
        state.attributes = Some(attributes);
        state.document = Some(object);
        state.pending.clear();
        Ok(())
    }

    /// Sends pending edits plus `values` as a partial update, then re-reads
    /// the resource.
    pub fn update(&self, values: Attributes) -> RallyResult<()> {
        let (session, url) = self.bound("update")?;
        let resource_type = self
            .resource_type()
            .ok_or_else(|| RallyError::InvalidState("missing object type".to_string()))?;

        let mut changes = self.pending();
        changes.merge(&values);
        let payload = update_payload(&resource_type, &url, &changes)?;
        session.post(&url, &payload)?;
        info!(reference = %url, "Updated resource");

        self.inner.borrow_mut().pending.clear();
        self.load(&session, &url)
    }

    /// Deletes the resource. The instance must not be used afterwards.
    pub fn delete(&self) -> RallyResult<()> {
        let (session, url) = self.bound("delete")?;
        session.delete(&url)?;
        info!(reference = %url, "Deleted resource");
        Ok(())
    }

    /// An independent copy: same document, parse and pending edits, no
    /// shared mutable state.
    pub fn duplicate(&self) -> Resource {
        let state = self.inner.borrow();
        Self::from_state(state.copy(state.policy))
    }

    /// A copy read with a fixed collection policy.
    pub(crate) fn with_policy(&self, policy: CollectionPolicy) -> Resource {
        Self::from_state(self.inner.borrow().copy(Some(policy)))
    }

    /// The type definition for this resource's type in its workspace.
    ///
    /// `None` for users, workspaces and subscriptions, which have none.
    pub fn typedef(&self) -> RallyResult<Option<TypeDefinition>> {
        let Some(resource_type) = self.resource_type() else {
            return Ok(None);
        };
        if UNTYPED.iter().any(|t| resource_type.contains(t)) {
            return Ok(None);
        }
        let session = self
            .session()
            .ok_or_else(|| RallyError::InvalidState("cannot load type definition: missing client".to_string()))?;
        let workspace = match self.get("workspace")? {
            Some(AttributeValue::Resource(workspace)) => Some(workspace),
            _ => None,
        };
        session.types()?.lookup(workspace.as_ref(), &resource_type)
    }

    /// True if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(state) => f
                .debug_struct("Resource")
                .field("ref", &state.ref_url())
                .field("type", &state.resource_type())
                .field("materialized", &state.attributes.is_some())
                .field("pending", &state.pending.len())
                .finish(),
            Err(_) => f.write_str("Resource { .. }"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name().or_else(|| self.ref_url()) {
            Some(label) => f.write_str(&label),
            None => f.write_str("(unsaved)"),
        }
    }
}

/// Same instance, or same `ref`.
impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.ref_url(), other.ref_url()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ref_url().hash(state);
    }
}

impl PartialOrd for Resource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// By `ref`; unsaved resources sort first, among themselves by address.
impl Ord for Resource {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ref_url(), other.ref_url()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Rc::as_ptr(&self.inner).cmp(&Rc::as_ptr(&other.inner)),
        }
    }
}
