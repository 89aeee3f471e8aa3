//! The runtime value representation produced by execution and consumed by scalars.
//!
//! Unlike the teacher's generic `ScalarValue` machinery, this crate fixes the leaf
//! scalar representation to [`serde_json::Value`]: spec.md explicitly treats
//! map-valued inputs/outputs as a pass-through JSON scalar rather than a first-class
//! container, so there is no need for a pluggable scalar backend.

mod object;

pub use self::object::Object;

use std::fmt;

use serde::Serialize;
use serde_json::Value as Json;

/// A resolved GraphQL value, shaped like the document that produced it.
///
/// This is the executor's output representation: [`Value::Object`] and
/// [`Value::List`] carry the GraphQL shape (selection order, list nesting), while
/// [`Value::Scalar`] defers to a plain JSON leaf for every fundamental and custom
/// scalar alike.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A GraphQL `null`, produced by an absent pointer/optional field.
    Null,
    /// Any scalar leaf (String, Int, Float, Boolean, ID, or a custom scalar).
    Scalar(Json),
    /// An ordered list of values, in resolver-return order.
    List(Vec<Value>),
    /// An ordered object, in selection-set (post-alias) order.
    Object(Object),
}

impl Value {
    /// Shorthand for constructing a [`Value::Scalar`] from anything JSON-serializable.
    pub fn scalar<T: Into<Json>>(v: T) -> Self {
        Value::Scalar(v.into())
    }

    /// `true` if this value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the inner [`Object`], if this is [`Value::Object`].
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrows the inner list, if this is [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => f.write_str("<unserializable value>"),
        }
    }
}

impl From<Json> for Value {
    fn from(j: Json) -> Self {
        match j {
            Json::Null => Value::Null,
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                let mut obj = Object::with_capacity(map.len());
                for (k, v) in map {
                    obj.insert(k, Value::from(v));
                }
                Value::Object(obj)
            }
            scalar => Value::Scalar(scalar),
        }
    }
}
