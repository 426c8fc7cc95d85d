//! Attribute values.

use crate::resource::Resource;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fmt;

/// A value held by a resource attribute, either parsed from a document or
/// set locally as a pending edit.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// An empty element, or an explicit null edit.
    Null,
    Text(String),
    Integer(i64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    /// Another resource: a lazy reference or an embedded object.
    Resource(Resource),
    /// Repeated elements or an unnamed collection, in document order.
    List(Vec<AttributeValue>),
    /// A nested element, or a named collection keyed by display name.
    Map(Attributes),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            AttributeValue::Resource(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            AttributeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up `key` in a map value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Every value in a list or map, with nested lists flattened one level.
    /// A single value yields itself.
    pub fn flatten(&self) -> Vec<AttributeValue> {
        let items: Vec<&AttributeValue> = match self {
            AttributeValue::List(items) => items.iter().collect(),
            AttributeValue::Map(map) => map.values().collect(),
            other => return vec![other.clone()],
        };
        items
            .into_iter()
            .flat_map(|item| match item {
                AttributeValue::List(inner) => inner.clone(),
                other => vec![other.clone()],
            })
            .collect()
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Integer(n) => write!(f, "{n}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::DateTime(dt) => {
                f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            AttributeValue::Resource(r) => match r.ref_url() {
                Some(url) => f.write_str(&url),
                None => f.write_str("null"),
            },
            AttributeValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            AttributeValue::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Integer(n)
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Integer(n.into())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(dt)
    }
}

impl From<Resource> for AttributeValue {
    fn from(r: Resource) -> Self {
        AttributeValue::Resource(r)
    }
}

impl From<&Resource> for AttributeValue {
    fn from(r: &Resource) -> Self {
        AttributeValue::Resource(r.clone())
    }
}

impl From<Attributes> for AttributeValue {
    fn from(map: Attributes) -> Self {
        AttributeValue::Map(map)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

/// Attribute name to value, in insertion order. Keys are snake_case
/// symbols, or display names inside a named collection.
#[derive(Clone, Default)]
pub struct Attributes {
    entries: Vec<(String, AttributeValue)>,
    /// Position of each key in `entries`.
    index: HashMap<String, usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttributeValue> {
        let i = *self.index.get(key)?;
        Some(&mut self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or replaces in place, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        let removed = self.index.remove(key)?;
        for position in self.index.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
        Some(self.entries.remove(removed).1)
    }

    /// Copies every entry of `other` over this map.
    pub fn merge(&mut self, other: &Attributes) {
        for (k, v) in other.iter() {
            self.insert(k, v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &AttributeValue> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Same entries in the same order.
impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Attributes::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut map = Attributes::new();
        map.insert("a", "1");
        map.insert("b", "2");
        assert_eq!(map.insert("a", "3"), Some(AttributeValue::from("1")));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(map.get("a"), Some(&AttributeValue::from("3")));
    }

    #[test]
    fn remove_keeps_later_keys_reachable() {
        let mut map: Attributes = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        assert_eq!(map.remove("a"), Some(AttributeValue::from("1")));
        assert_eq!(map.get("b"), Some(&AttributeValue::from("2")));
        assert_eq!(map.get("c"), Some(&AttributeValue::from("3")));
        assert!(!map.contains_key("a"));

        map.insert("a", "4");
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "c", "a"]);
        assert_eq!(map.get("a"), Some(&AttributeValue::from("4")));
    }

    #[test]
    fn wide_maps_keep_every_key() {
        let map: Attributes = (0..2_000i64).map(|i| (format!("field_{i}"), i)).collect();
        assert_eq!(map.len(), 2_000);
        assert_eq!(map.get("field_1999"), Some(&AttributeValue::Integer(1999)));
        assert_eq!(map.keys().next(), Some("field_0"));
    }

    #[test]
    fn flatten_lifts_nested_lists() {
        let mut map = Attributes::new();
        map.insert("t1", "one");
        map.insert("t2", vec!["two", "three"]);
        let flat = AttributeValue::Map(map).flatten();
        assert_eq!(flat, vec![
            AttributeValue::from("one"),
            AttributeValue::from("two"),
            AttributeValue::from("three"),
        ]);
    }

    #[test]
    fn option_none_is_null() {
        let missing: Option<&str> = None;
        assert!(AttributeValue::from(missing).is_null());
    }
}
