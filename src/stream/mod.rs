//! Change-stream record model.
//!
//! The primary store emits row-level mutation events (INSERT/MODIFY/REMOVE)
//! with keys and item images in its attribute-typed wire encoding. This
//! module models that encoding as a recursive tagged-variant decoder shared
//! by every consumer of raw records.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

pub mod normalize;

pub use normalize::{normalize, NormalizedOp};

/// A batch of raw change records as delivered by the stream trigger.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

/// One row-level mutation event.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRecord {
    /// `INSERT`, `MODIFY`, or `REMOVE`.
    #[serde(rename = "eventName", default)]
    pub event_name: String,
    #[serde(rename = "dynamodb", default)]
    pub change: ChangePayload,
}

/// Keys and item images carried by a change record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePayload {
    #[serde(rename = "Keys", default)]
    pub keys: HashMap<String, AttrValue>,
    /// Present for INSERT/MODIFY when the stream exposes new images.
    #[serde(rename = "NewImage")]
    pub new_image: Option<HashMap<String, AttrValue>>,
    #[serde(rename = "OldImage")]
    pub old_image: Option<HashMap<String, AttrValue>>,
}

/// The store's attribute-typed value encoding.
///
/// Externally tagged, so `{"S": "text"}` deserializes to `AttrValue::S`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum AttrValue {
    S(String),
    /// Numbers arrive as strings to preserve precision.
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    M(HashMap<String, AttrValue>),
    L(Vec<AttrValue>),
}

impl AttrValue {
    /// Borrow the string payload of an `S` attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Decode into a plain JSON value suitable for indexing.
    pub fn into_json(self) -> Value {
        match self {
            AttrValue::S(s) => Value::String(s),
            // Fall back to the literal string when it is not valid JSON
            // number syntax, rather than dropping the field.
            AttrValue::N(n) => match n.parse::<serde_json::Number>() {
                Ok(num) => Value::Number(num),
                Err(_) => Value::String(n),
            },
            AttrValue::Bool(b) => Value::Bool(b),
            AttrValue::Null(_) => Value::Null,
            AttrValue::M(map) => Value::Object(attrs_to_json(map)),
            AttrValue::L(list) => Value::Array(list.into_iter().map(Self::into_json).collect()),
        }
    }
}

/// Decode an attribute map into a flat JSON object.
pub fn attrs_to_json(attrs: HashMap<String, AttrValue>) -> Map<String, Value> {
    attrs
        .into_iter()
        .map(|(k, v)| (k, v.into_json()))
        .collect()
}
