//! Request bodies for create and update.
//!
//! Keys are written in sorted order with camel-cased element names. Values
//! map to elements as follows:
//!
//! | value            | element                              |
//! |------------------|--------------------------------------|
//! | text, number     | `<Key>text</Key>`                    |
//! | date-time        | `<Key>2024-01-31T12:00:00Z</Key>`    |
//! | null             | `<Key ref="null"/>`                  |
//! | resource         | `<Key ref="url"/>`                   |
//! | map              | `<Key>` with one child per entry     |
//! | list, or any key in [`COLLECTION_ATTRIBUTES`] | `<Key>` wrapping `<ItemType ref="url"/>` per item |

use crate::error::{RallyError, RallyResult};
use crate::resource::Resource;
use crate::value::{AttributeValue, Attributes};
use crate::xml::Element;
use rally_query::names::camel_case_word;

/// Attributes whose values are always written as a collection of
/// references, even when given a single resource.
pub const COLLECTION_ATTRIBUTES: [&str; 10] = [
    "tags",
    "dependents",
    "dependencies",
    "defects",
    "duplicates",
    "children",
    "predecessors",
    "test_cases",
    "artifacts",
    "changesets",
];

/// Body of a create request. The root is the camel-cased type.
pub fn create_payload(resource_type: &str, values: &Attributes) -> RallyResult<String> {
    let root = fill(Element::new(camel_case_word(resource_type)), values)?;
    root.to_document()
}

/// Body of an update request. The root is the type as given, carrying the
/// resource's `ref`.
pub fn update_payload(resource_type: &str, ref_url: &str, values: &Attributes) -> RallyResult<String> {
    let root = fill(
        Element::new(resource_type).with_attribute("ref", ref_url),
        values,
    )?;
    root.to_document()
}

fn fill(mut parent: Element, values: &Attributes) -> RallyResult<Element> {
    let mut entries: Vec<(&str, &AttributeValue)> = values.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in entries {
        let name = camel_case_word(key);
        let child = if COLLECTION_ATTRIBUTES.contains(&key) {
            collection(name, value)?
        } else {
            element(name, value)?
        };
        parent.children.push(child);
    }
    Ok(parent)
}

fn element(name: String, value: &AttributeValue) -> RallyResult<Element> {
    Ok(match value {
        AttributeValue::Null => Element::new(name).with_attribute("ref", "null"),
        AttributeValue::Resource(resource) => {
            Element::new(name).with_attribute("ref", saved_ref(resource)?)
        }
        AttributeValue::Map(map) => fill(Element::new(name), map)?,
        AttributeValue::List(_) => collection(name, value)?,
        scalar => Element::new(name).with_text(scalar.to_string()),
    })
}

/// A wrapper element with one reference child per item. Null writes an
/// empty wrapper, clearing the collection.
fn collection(name: String, value: &AttributeValue) -> RallyResult<Element> {
    let items: &[AttributeValue] = match value {
        AttributeValue::List(items) => items,
        AttributeValue::Null => &[],
        single => std::slice::from_ref(single),
    };

    let mut wrapper = Element::new(name);
    for item in items {
        let AttributeValue::Resource(resource) = item else {
            return Err(RallyError::InvalidState(format!(
                "collection {} can only hold resources, got {item}",
                wrapper.name
            )));
        };
        let item_type = resource.resource_type().ok_or_else(|| {
            RallyError::InvalidState(format!("collection {} holds a resource without a type", wrapper.name))
        })?;
        wrapper
            .children
            .push(Element::new(item_type).with_attribute("ref", saved_ref(resource)?));
    }
    Ok(wrapper)
}

fn saved_ref(resource: &Resource) -> RallyResult<String> {
    resource
        .ref_url()
        .ok_or_else(|| RallyError::InvalidState("cannot reference an unsaved resource".to_string()))
}
