//! An ordered `name -> Value` map, grounded on the teacher's `value/object.rs`.

use indexmap::IndexMap;
use serde::Serialize;

use super::Value;

/// A GraphQL object result: preserves the order fields were inserted in (which the
/// executor drives from post-alias selection order, per spec.md §4.D step 5).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Object {
    fields: IndexMap<String, Value>,
}

impl Object {
    /// Creates an empty [`Object`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty [`Object`] pre-sized for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Object {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a field, keeping insertion order (later calls with the same key
    /// update the value in place without moving its position).
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Looks up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of fields currently in the object.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if the object has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Object {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
