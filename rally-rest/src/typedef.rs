//! Type definitions: the server's schema, read as resources.

use crate::api::RallyClient;
use crate::config::CollectionPolicy;
use crate::error::RallyResult;
use crate::resource::Resource;
use crate::value::{AttributeValue, Attributes};
use rally_query::names::underscore;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Attribute definitions keyed by the attribute's snake_case symbol.
pub type AttributeDefinitions = BTreeMap<String, AttributeDefinition>;

/// Cache key: workspace ref (empty when there is none) and type name.
type CacheKey = (String, String);

/// Type definitions memoized per `(workspace, type)`.
///
/// Each client owns one cache. Entries never expire; [`clear`](Self::clear)
/// drops them all. The cache is single-threaded.
#[derive(Debug, Default)]
pub struct TypeDefinitionCache {
    entries: RefCell<HashMap<CacheKey, Option<TypeDefinition>>>,
}

impl TypeDefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drops every cached definition.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// The definition of `type_name` in `workspace`.
    ///
    /// On a miss the workspace's full list of type definitions is read and
    /// scanned for a matching element name. Misses are cached too.
    pub fn lookup(
        &self,
        workspace: Option<&Resource>,
        type_name: &str,
    ) -> RallyResult<Option<TypeDefinition>> {
        let key = Self::key(workspace, type_name);
        if let Some(hit) = self.entries.borrow().get(&key) {
            return Ok(hit.clone());
        }

        debug!(type_name, workspace = %key.0, "Type definition cache miss");
        let found = match workspace {
            Some(workspace) => TypeDefinition::find_in(workspace, type_name)?,
            None => None,
        };
        self.entries.borrow_mut().insert(key, found.clone());
        Ok(found)
    }

    /// The cached definition for `key`, or `make()` stored under it.
    fn get_or_insert_with(
        &self,
        key: CacheKey,
        make: impl FnOnce() -> TypeDefinition,
    ) -> TypeDefinition {
        let mut entries = self.entries.borrow_mut();
        let slot = entries.entry(key).or_insert(None);
        slot.get_or_insert_with(make).clone()
    }

    fn key(workspace: Option<&Resource>, type_name: &str) -> CacheKey {
        (
            workspace.and_then(Resource::ref_url).unwrap_or_default(),
            type_name.to_string(),
        )
    }
}

/// One schema type: its element name, parent type and attributes.
///
/// Backed by a resource whose collections are always read as name-keyed
/// maps.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    resource: Resource,
}

impl TypeDefinition {
    /// Views `resource` as a type definition.
    pub fn from_resource(resource: &Resource) -> Self {
        Self {
            resource: resource.with_policy(CollectionPolicy::Named),
        }
    }

    /// Parses a type definition document.
    pub fn from_xml(client: Option<&RallyClient>, xml: &str) -> RallyResult<Self> {
        Ok(Self::from_resource(&Resource::from_xml(client, xml)?))
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    fn find_in(workspace: &Resource, type_name: &str) -> RallyResult<Option<TypeDefinition>> {
        let Some(definitions) = workspace.get("type_definitions")? else {
            return Ok(None);
        };
        for value in definitions.flatten() {
            let AttributeValue::Resource(resource) = value else {
                continue;
            };
            let candidate = TypeDefinition::from_resource(&resource);
            if candidate.element_name()?.as_deref() == Some(type_name) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Element name of the type, e.g. `HierarchicalRequirement`.
    pub fn element_name(&self) -> RallyResult<Option<String>> {
        self.resource.text("element_name")
    }

    /// The element name as a snake_case symbol.
    pub fn type_symbol(&self) -> RallyResult<Option<String>> {
        Ok(self.element_name()?.map(|n| underscore(&n)))
    }

    /// The parent type, looked up through the client's cache.
    pub fn parent(&self) -> RallyResult<Option<TypeDefinition>> {
        let Some(AttributeValue::Resource(parent)) = self.resource.get("parent")? else {
            return Ok(None);
        };
        let type_name = parent.name().unwrap_or_default().replace(' ', "");
        let workspace = match self.resource.get("workspace")? {
            Some(AttributeValue::Resource(workspace)) => Some(workspace),
            _ => None,
        };
        let key = TypeDefinitionCache::key(workspace.as_ref(), &type_name);

        let cache = self.resource.session().and_then(|s| s.types().ok());
        Ok(Some(match cache {
            Some(cache) => cache.get_or_insert_with(key, || TypeDefinition::from_resource(&parent)),
            None => TypeDefinition::from_resource(&parent),
        }))
    }

    /// Attributes of this type. With `include_parent`, the attributes of
    /// every ancestor are merged in, walking up from this type; an ancestor's
    /// entry replaces a same-named entry collected earlier.
    pub fn attributes(&self, include_parent: bool) -> RallyResult<AttributeDefinitions> {
        let mut all = self.own_attributes()?;
        if include_parent {
            let mut ancestor = self.parent()?;
            while let Some(typedef) = ancestor {
                all.extend(typedef.own_attributes()?);
                ancestor = typedef.parent()?;
            }
        }
        Ok(all)
    }

    fn own_attributes(&self) -> RallyResult<AttributeDefinitions> {
        let mut definitions = AttributeDefinitions::new();
        let Some(attributes) = self.resource.get("attributes")? else {
            return Ok(definitions);
        };
        for value in attributes.flatten() {
            let definition = match value {
                AttributeValue::Resource(resource) => AttributeDefinition::new(resource.attributes()?),
                AttributeValue::Map(map) => AttributeDefinition::new(map),
                _ => continue,
            };
            if let Some(element_name) = definition.element_name() {
                definitions.insert(underscore(element_name), definition);
            }
        }
        Ok(definitions)
    }

    fn select(
        &self,
        include_parent: bool,
        keep: impl Fn(&AttributeDefinition) -> bool,
    ) -> RallyResult<AttributeDefinitions> {
        Ok(self
            .attributes(include_parent)?
            .into_iter()
            .filter(|(_, d)| keep(d))
            .collect())
    }

    /// Attributes added by the workspace rather than built in.
    pub fn custom_attributes(&self) -> RallyResult<AttributeDefinitions> {
        self.select(false, |d| d.custom() == Some("true"))
    }

    /// Attributes limited to a set of allowed values.
    pub fn constrained_attributes(&self) -> RallyResult<AttributeDefinitions> {
        self.select(false, |d| d.constrained() == Some("true"))
    }

    /// Custom dropdowns: custom and constrained.
    pub fn custom_constrained_attributes(&self) -> RallyResult<AttributeDefinitions> {
        self.select(false, |d| {
            d.custom() == Some("true") && d.constrained() == Some("true")
        })
    }

    pub fn custom_dropdown_attributes(&self) -> RallyResult<AttributeDefinitions> {
        self.custom_constrained_attributes()
    }

    pub fn collection_attributes(&self, include_parent: bool) -> RallyResult<AttributeDefinitions> {
        self.select(include_parent, |d| d.attribute_type() == Some("COLLECTION"))
    }

    pub fn object_attributes(&self, include_parent: bool) -> RallyResult<AttributeDefinitions> {
        self.select(include_parent, |d| d.attribute_type() == Some("OBJECT"))
    }

    /// Collection and object attributes together.
    pub fn reference_attributes(&self, include_parent: bool) -> RallyResult<AttributeDefinitions> {
        let mut all = self.collection_attributes(include_parent)?;
        all.extend(self.object_attributes(include_parent)?);
        Ok(all)
    }
}

/// Metadata of one attribute within a type definition.
///
/// Flags are kept as the strings the server sent (`"true"`/`"false"`).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    attributes: Attributes,
}

impl AttributeDefinition {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    /// Always `"AttributeDefinition"`.
    pub fn resource_type(&self) -> &'static str {
        "AttributeDefinition"
    }

    /// Attribute definitions are not addressable.
    pub fn ref_url(&self) -> Option<String> {
        None
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(AttributeValue::as_text)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn element_name(&self) -> Option<&str> {
        self.text("element_name")
    }

    /// `STRING`, `TEXT`, `OBJECT`, `COLLECTION`, ...
    pub fn attribute_type(&self) -> Option<&str> {
        self.text("attribute_type")
    }

    pub fn custom(&self) -> Option<&str> {
        self.text("custom")
    }

    pub fn constrained(&self) -> Option<&str> {
        self.text("constrained")
    }

    /// The `StringValue` of each allowed value, `None` for the empty choice.
    pub fn allowed_values(&self) -> Vec<Option<String>> {
        let Some(values) = self.attributes.get("allowed_values") else {
            return Vec::new();
        };
        values
            .flatten()
            .into_iter()
            .map(|value| {
                let string_value = match &value {
                    AttributeValue::Resource(resource) => resource.cached("string_value"),
                    AttributeValue::Map(map) => map.get("string_value").cloned(),
                    _ => None,
                };
                string_value.and_then(|v| v.as_text().map(str::to_string))
            })
            .collect()
    }
}
