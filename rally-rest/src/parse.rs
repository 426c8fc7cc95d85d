//! Turning an element tree into attributes.
//!
//! Every node is first classified into a [`NodeKind`]; only then does the
//! collection policy decide how named groups are exposed.

use crate::config::CollectionPolicy;
use crate::resource::Resource;
use crate::session::Session;
use crate::value::{AttributeValue, Attributes};
use crate::xml::Element;
use rally_query::names::underscore;
use std::collections::HashSet;
use std::rc::Rc;

/// Shape of a node, decided from the node and its direct children alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// No children and no `ref`: the text content, if any.
    Scalar,
    /// Carries a `ref`. Without children it is a lazy stub, with children an
    /// embedded object.
    Reference,
    /// No attributes, and every child carries a `ref`; none has a display
    /// name.
    Sequence,
    /// Like [`NodeKind::Sequence`], but at least one child carries both `ref`
    /// and `refObjectName`.
    NamedGroup,
    /// Any other node with children: a nested attribute mapping.
    Mapping,
}

/// Classifies `node`.
pub fn classify(node: &Element) -> NodeKind {
    if node.attribute("ref").is_some() {
        return NodeKind::Reference;
    }
    if !node.has_children() {
        return NodeKind::Scalar;
    }
    let collection = !node.has_attributes()
        && node.children.iter().all(|c| c.attribute("ref").is_some());
    if !collection {
        return NodeKind::Mapping;
    }
    let named = node
        .children
        .iter()
        .any(|c| c.attribute("refObjectName").is_some());
    if named {
        NodeKind::NamedGroup
    } else {
        NodeKind::Sequence
    }
}

/// Parses element trees into attribute values. Nested resources are bound
/// to the same session and read with the session's collection policy.
pub(crate) struct Parser<'a> {
    pub session: Option<&'a Rc<Session>>,
    pub policy: CollectionPolicy,
}

impl Parser<'_> {
    /// Attributes of a materialized node: one entry per distinct child tag,
    /// keyed by the underscored tag. A repeated tag turns its entry into a
    /// list holding every occurrence in document order.
    pub fn attributes(&self, node: &Element) -> Attributes {
        let mut attributes = Attributes::new();
        let mut repeated: HashSet<String> = HashSet::new();

        for child in &node.children {
            let key = underscore(&child.name);
            let value = self.value(child);
            match attributes.get_mut(&key) {
                None => {
                    attributes.insert(key, value);
                }
                Some(AttributeValue::List(items)) if repeated.contains(&key) => items.push(value),
                Some(existing) => {
                    let first = std::mem::replace(existing, AttributeValue::Null);
                    *existing = AttributeValue::List(vec![first, value]);
                    repeated.insert(key);
                }
            }
        }
        attributes
    }

    pub fn value(&self, node: &Element) -> AttributeValue {
        match classify(node) {
            NodeKind::Scalar => match &node.text {
                Some(text) => AttributeValue::Text(text.clone()),
                None => AttributeValue::Null,
            },
            NodeKind::Reference => {
                AttributeValue::Resource(Resource::from_element(self.session.cloned(), node.clone(), None))
            }
            NodeKind::Sequence => self.sequence(node),
            NodeKind::NamedGroup => match self.policy {
                CollectionPolicy::Named => AttributeValue::Map(self.named_group(node)),
                CollectionPolicy::Flat => self.sequence(node),
            },
            NodeKind::Mapping => AttributeValue::Map(self.attributes(node)),
        }
    }

    fn sequence(&self, node: &Element) -> AttributeValue {
        AttributeValue::List(node.children.iter().map(|c| self.value(c)).collect())
    }

    /// Children keyed by display name. A name seen twice becomes a list.
    fn named_group(&self, node: &Element) -> Attributes {
        let mut group = Attributes::new();
        let mut stacked: HashSet<String> = HashSet::new();

        for child in &node.children {
            let name = child.attribute("refObjectName").unwrap_or_default().to_string();
            let value = self.value(child);
            match group.get_mut(&name) {
                None => {
                    group.insert(name, value);
                }
                Some(AttributeValue::List(items)) if stacked.contains(&name) => items.push(value),
                Some(existing) => {
                    let first = std::mem::replace(existing, AttributeValue::Null);
                    *existing = AttributeValue::List(vec![first, value]);
                    stacked.insert(name);
                }
            }
        }
        group
    }
}
