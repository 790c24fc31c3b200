//! Logical schema documents: one per field, plus the version registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::json_type_name;
use crate::types::{TagError, TagResult};

/// One entry of a field's `values` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ValueNode {
    /// A plain permitted value.
    Leaf(String),
    /// A permitted value with nested children, written `{"label": [...]}`.
    Branch { label: String, children: Vec<ValueNode> },
}

impl ValueNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self::Leaf(label.into())
    }

    pub fn branch(label: impl Into<String>, children: Vec<ValueNode>) -> Self {
        Self::Branch {
            label: label.into(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Leaf(label) | Self::Branch { label, .. } => label,
        }
    }

    /// Parse a JSON `values` element.
    pub fn from_json(value: &Value) -> TagResult<Self> {
        match value {
            Value::String(label) => Ok(Self::Leaf(label.clone())),
            Value::Object(map) => {
                if map.len() != 1 {
                    return Err(TagError::schema(format!(
                        "Hierarchical entry must have exactly one label, got {}",
                        map.len()
                    )));
                }
                let (label, children) = map
                    .iter()
                    .next()
                    .ok_or_else(|| TagError::schema("Hierarchical entry is empty"))?;
                let Value::Array(children) = children else {
                    return Err(TagError::schema(format!(
                        "Children of '{label}' must be a list, got {}",
                        json_type_name(children)
                    )));
                };
                Ok(Self::Branch {
                    label: label.clone(),
                    children: children.iter().map(Self::from_json).collect::<TagResult<_>>()?,
                })
            }
            other => Err(TagError::schema(format!(
                "Invalid schema entry type: {}",
                json_type_name(other)
            ))),
        }
    }
}

impl TryFrom<Value> for ValueNode {
    type Error = TagError;

    fn try_from(value: Value) -> TagResult<Self> {
        Self::from_json(&value)
    }
}

impl From<ValueNode> for Value {
    fn from(node: ValueNode) -> Self {
        match node {
            ValueNode::Leaf(label) => Value::String(label),
            ValueNode::Branch { label, children } => {
                let mut map = serde_json::Map::new();
                map.insert(label, Value::Array(children.into_iter().map(Value::from).collect()));
                Value::Object(map)
            }
        }
    }
}

/// The schema document for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDocument {
    /// Schema version the document belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether complete descriptors must set this field.
    #[serde(default)]
    pub required: bool,
    /// Human-readable description (descriptive only).
    #[serde(default)]
    pub description: String,
    /// Permitted values, possibly nested.
    pub values: Vec<ValueNode>,
}

impl FieldDocument {
    pub fn new(version: impl Into<String>, required: bool, values: Vec<ValueNode>) -> Self {
        Self {
            version: Some(version.into()),
            required,
            description: String::new(),
            values,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Parse a field document from JSON text.
pub fn parse_field_document(raw: &str) -> TagResult<FieldDocument> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| TagError::schema(format!("Invalid JSON in field document: {err}")))?;
    field_document_from_value(value)
}

/// Convert an already-parsed JSON value into a field document.
pub fn field_document_from_value(value: Value) -> TagResult<FieldDocument> {
    let Value::Object(map) = &value else {
        return Err(TagError::schema(format!(
            "Field document must be an object, got {}",
            json_type_name(&value)
        )));
    };
    match map.get("values") {
        None => return Err(TagError::schema("Field document missing required 'values' key")),
        Some(Value::Array(_)) => {}
        Some(other) => {
            return Err(TagError::schema(format!(
                "'values' must be a list, got {}",
                json_type_name(other)
            )))
        }
    }
    serde_json::from_value(value).map_err(|err| TagError::schema(err.to_string()))
}

/// Registry metadata for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Document providing the field, relative to the version directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Maps each supported schema version to the fields it declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub versions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldEntry>,
}

impl RegistryDocument {
    /// Parse a registry from JSON text.
    pub fn from_json_str(raw: &str) -> TagResult<Self> {
        serde_json::from_str(raw).map_err(|err| TagError::schema(format!("Invalid registry: {err}")))
    }

    /// Fields declared for a version.
    pub fn fields_for(&self, version: &str) -> Option<&[String]> {
        self.versions.get(version).map(Vec::as_slice)
    }

    /// File name of the document providing a field.
    pub fn document_name(&self, field: &str) -> String {
        self.fields
            .get(field)
            .and_then(|entry| entry.file.clone())
            .unwrap_or_else(|| format!("{field}.json"))
    }
}
