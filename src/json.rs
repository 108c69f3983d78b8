//! Dynamic records backed by JSON values.
//!
//! Untyped documents carry no annotations of their own, so the annotations
//! come from a [`FieldTags`] tree that mirrors the document's object
//! structure:
//!
//! ```yaml
//! fields:
//!   name:
//!     tags:
//!       validation: "length:op:>=,val:4"
//!   address:
//!     fields:
//!       city:
//!         tags:
//!           validation: "min_length:2"
//! ```
//!
//! Every object key is a public field. Fields keep document order. The view
//! is built before the walk, so it enforces the same nesting limit itself.

use crate::error::{ConfigError, LogicError};
use crate::record::{Field, FieldValue, Inspect, Record, Tags};
use crate::validator::DEFAULT_MAX_DEPTH;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Annotations for the fields of one JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldTags {
    /// Tag key → annotation for the field this node describes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tags: IndexMap<String, String>,
    /// Nodes for the fields of a nested object.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, FieldTags>,
}

impl FieldTags {
    pub fn from_yaml(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(input).map_err(|e| ConfigError::Yaml {
            message: e.to_string(),
        })
    }

    /// Sets the annotation of the field at the dotted `path`, creating
    /// intermediate nodes as needed.
    #[must_use]
    pub fn with(mut self, path: &str, key: &str, annotation: &str) -> Self {
        let mut node = &mut self;
        for segment in path.split('.') {
            node = node.fields.entry(segment.to_string()).or_default();
        }
        node.tags.insert(key.to_string(), annotation.to_string());
        self
    }
}

/// A JSON value prepared for validation.
#[derive(Debug)]
pub enum JsonValue<'a> {
    Text(&'a str),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Null,
    Array,
    Object(JsonRecord<'a>),
}

impl<'a> JsonValue<'a> {
    /// Builds the view of `value` described by `tags`, allowing objects to
    /// nest as deep as a default validator walks.
    ///
    /// # Errors
    ///
    /// Returns [`LogicError::DepthExceeded`] when objects nest deeper than
    /// [`DEFAULT_MAX_DEPTH`].
    pub fn new(value: &'a Value, tags: &'a FieldTags) -> Result<Self, LogicError> {
        Self::with_max_depth(value, tags, DEFAULT_MAX_DEPTH)
    }

    /// Like [`JsonValue::new`] with an explicit nesting limit. Pass the
    /// [`max_depth`](crate::Validator::max_depth) of the validator that will
    /// walk the view.
    pub fn with_max_depth(
        value: &'a Value,
        tags: &'a FieldTags,
        max_depth: usize,
    ) -> Result<Self, LogicError> {
        Self::build(value, tags, 0, max_depth)
    }

    fn build(
        value: &'a Value,
        tags: &'a FieldTags,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self, LogicError> {
        let view = match value {
            Value::String(s) => JsonValue::Text(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    JsonValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    JsonValue::Uint(u)
                } else {
                    JsonValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Null => JsonValue::Null,
            Value::Array(_) => JsonValue::Array,
            Value::Object(map) => {
                if depth > max_depth {
                    return Err(LogicError::DepthExceeded { limit: max_depth });
                }
                let fields = map
                    .iter()
                    .map(|(name, value)| -> Result<JsonField<'a>, LogicError> {
                        let node = tags.fields.get(name);
                        Ok(JsonField {
                            name,
                            tags: node.map_or(Tags::None, |n| Tags::Map(&n.tags)),
                            value: Self::build(
                                value,
                                node.unwrap_or(&*EMPTY),
                                depth + 1,
                                max_depth,
                            )?,
                        })
                    })
                    .collect::<Result<_, _>>()?;
                JsonValue::Object(JsonRecord { fields })
            }
        };
        Ok(view)
    }
}

static EMPTY: LazyLock<FieldTags> = LazyLock::new(FieldTags::default);

impl Inspect for JsonValue<'_> {
    fn inspect(&self) -> FieldValue<'_> {
        match self {
            JsonValue::Text(s) => FieldValue::Text(s),
            JsonValue::Int(n) => FieldValue::Int(*n),
            JsonValue::Uint(n) => FieldValue::Uint(*n),
            JsonValue::Float(n) => FieldValue::Float(*n),
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Null => FieldValue::Absent,
            JsonValue::Array => FieldValue::Opaque("array"),
            JsonValue::Object(record) => FieldValue::Record(record),
        }
    }
}

#[derive(Debug)]
struct JsonField<'a> {
    name: &'a str,
    tags: Tags<'a>,
    value: JsonValue<'a>,
}

/// The fields of one JSON object, in document order.
#[derive(Debug)]
pub struct JsonRecord<'a> {
    fields: Vec<JsonField<'a>>,
}

impl Record for JsonRecord<'_> {
    fn type_name(&self) -> &'static str {
        "object"
    }

    fn fields(&self) -> Vec<Field<'_>> {
        self.fields
            .iter()
            .map(|f| Field {
                name: f.name,
                public: true,
                tags: f.tags,
                value: f.value.inspect(),
            })
            .collect()
    }
}
