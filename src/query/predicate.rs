//! Boolean predicates over indexed items.
//!
//! Predicates are pure filters: no ranking, scoring, or inference. Every
//! variant can be tested against an item and explained as a deterministic,
//! human-readable string.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::normalize::{get_depth, is_descendant_or_self};
use crate::types::IndexedItem;

/// Boolean test over an item's text.
pub type TextMatcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Boolean test over a whole item.
pub type ItemTest = Arc<dyn Fn(&IndexedItem) -> bool + Send + Sync>;

/// A node in a boolean expression tree over [`IndexedItem`].
#[derive(Clone)]
pub enum Predicate {
    /// Field equals a value.
    FieldEquals { field: String, value: String },
    /// Field is one of a set of values.
    FieldIn { field: String, values: BTreeSet<String> },
    /// Field starts with a raw string prefix (no hierarchy boundary).
    FieldStartsWith { field: String, prefix: String },
    /// Field equals `path`, or with `exact == false` also lies beneath it.
    HierarchyMatches { field: String, path: String, exact: bool },
    /// Segment count of the field lies within the bounds.
    HierarchyDepth {
        field: String,
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Text contains a substring.
    TextContains { needle: String, case_sensitive: bool },
    /// Arbitrary test over the text.
    TextMatches { matcher: TextMatcher, description: String },
    /// Metadata key holds exactly this value.
    MetadataEquals { key: String, value: Value },
    /// Metadata key is present.
    MetadataExists { key: String },
    CreatedAfter(DateTime<Utc>),
    CreatedBefore(DateTime<Utc>),
    UpdatedAfter(DateTime<Utc>),
    /// Every child holds. Empty is vacuously true.
    And(Vec<Predicate>),
    /// Some child holds.
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    AlwaysTrue,
    AlwaysFalse,
    /// Caller-supplied test, explained by its description.
    Custom { test: ItemTest, description: String },
}

impl Predicate {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::FieldIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field_starts_with(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::FieldStartsWith {
            field: field.into(),
            prefix: prefix.into(),
        }
    }

    pub fn hierarchy_matches(field: impl Into<String>, path: impl Into<String>, exact: bool) -> Self {
        Self::HierarchyMatches {
            field: field.into(),
            path: path.into(),
            exact,
        }
    }

    /// `path` itself or any descendant of it.
    pub fn under(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self::hierarchy_matches(field, path, false)
    }

    pub fn hierarchy_depth(field: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::HierarchyDepth {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn text_contains(needle: impl Into<String>, case_sensitive: bool) -> Self {
        Self::TextContains {
            needle: needle.into(),
            case_sensitive,
        }
    }

    pub fn text_matches<F>(matcher: F, description: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::TextMatches {
            matcher: Arc::new(matcher),
            description: description.into(),
        }
    }

    pub fn metadata_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::MetadataEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn metadata_exists(key: impl Into<String>) -> Self {
        Self::MetadataExists { key: key.into() }
    }

    pub fn created_after(at: DateTime<Utc>) -> Self {
        Self::CreatedAfter(at)
    }

    pub fn created_before(at: DateTime<Utc>) -> Self {
        Self::CreatedBefore(at)
    }

    pub fn updated_after(at: DateTime<Utc>) -> Self {
        Self::UpdatedAfter(at)
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(predicates.into_iter().collect())
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(predicates.into_iter().collect())
    }

    pub fn negate(predicate: Predicate) -> Self {
        Self::Not(Box::new(predicate))
    }

    pub fn custom<F>(test: F, description: impl Into<String>) -> Self
    where
        F: Fn(&IndexedItem) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            test: Arc::new(test),
            description: description.into(),
        }
    }

    /// Whether the item satisfies this predicate.
    pub fn test(&self, item: &IndexedItem) -> bool {
        match self {
            Self::FieldEquals { field, value } => item.field(field) == Some(value.as_str()),
            Self::FieldIn { field, values } => item.field(field).is_some_and(|v| values.contains(v)),
            Self::FieldStartsWith { field, prefix } => {
                item.field(field).is_some_and(|v| v.starts_with(prefix.as_str()))
            }
            Self::HierarchyMatches { field, path, exact } => match item.field(field) {
                None => false,
                Some(value) if *exact => value == path,
                Some(value) => is_descendant_or_self(value, path),
            },
            Self::HierarchyDepth { field, min, max } => match item.field(field) {
                None => false,
                Some(value) => {
                    let depth = get_depth(value);
                    min.map_or(true, |min| depth >= min) && max.map_or(true, |max| depth <= max)
                }
            },
            Self::TextContains { needle, case_sensitive } => {
                if *case_sensitive {
                    item.text.contains(needle.as_str())
                } else {
                    item.text.to_lowercase().contains(&needle.to_lowercase())
                }
            }
            Self::TextMatches { matcher, .. } => matcher(&item.text),
            Self::MetadataEquals { key, value } => item.metadata.get(key) == Some(value),
            Self::MetadataExists { key } => item.metadata.contains_key(key),
            Self::CreatedAfter(at) => item.created_at > *at,
            Self::CreatedBefore(at) => item.created_at < *at,
            Self::UpdatedAfter(at) => item.updated_at > *at,
            Self::And(children) => children.iter().all(|p| p.test(item)),
            Self::Or(children) => children.iter().any(|p| p.test(item)),
            Self::Not(inner) => !inner.test(item),
            Self::AlwaysTrue => true,
            Self::AlwaysFalse => false,
            Self::Custom { test, .. } => test(item),
        }
    }

    /// Deterministic description of the predicate.
    pub fn explain(&self) -> String {
        match self {
            Self::FieldEquals { field, value } => format!("{field} = '{value}'"),
            Self::FieldIn { field, values } => {
                let values: Vec<String> = values.iter().map(|v| format!("'{v}'")).collect();
                format!("{field} in [{}]", values.join(", "))
            }
            Self::FieldStartsWith { field, prefix } => format!("{field} starts with '{prefix}'"),
            Self::HierarchyMatches { field, path, exact: true } => format!("{field} = '{path}'"),
            Self::HierarchyMatches { field, path, exact: false } => format!("{field} under '{path}'"),
            Self::HierarchyDepth { field, min, max } => {
                let mut bounds = Vec::new();
                if let Some(min) = min {
                    bounds.push(format!("depth ≥ {min}"));
                }
                if let Some(max) = max {
                    bounds.push(format!("depth ≤ {max}"));
                }
                if bounds.is_empty() {
                    format!("{field} (any depth)")
                } else {
                    format!("{field} ({})", bounds.join(" and "))
                }
            }
            Self::TextContains { needle, case_sensitive } => {
                let mode = if *case_sensitive { "case-sensitive" } else { "case-insensitive" };
                format!("text contains '{needle}' ({mode})")
            }
            Self::TextMatches { description, .. } => format!("text {description}"),
            Self::MetadataEquals { key, value } => format!("metadata['{key}'] = {}", value_repr(value)),
            Self::MetadataExists { key } => format!("metadata['{key}'] exists"),
            Self::CreatedAfter(at) => format!("created after {}", timestamp(at)),
            Self::CreatedBefore(at) => format!("created before {}", timestamp(at)),
            Self::UpdatedAfter(at) => format!("updated after {}", timestamp(at)),
            Self::And(children) => join_children(children, " AND "),
            Self::Or(children) => join_children(children, " OR "),
            Self::Not(inner) => format!("NOT ({})", inner.explain()),
            Self::AlwaysTrue => "always true".to_string(),
            Self::AlwaysFalse => "always false".to_string(),
            Self::Custom { description, .. } => description.clone(),
        }
    }

    /// Direct children of a combinator; empty for leaves.
    pub fn children(&self) -> Vec<&Predicate> {
        match self {
            Self::And(children) | Self::Or(children) => children.iter().collect(),
            Self::Not(inner) => vec![inner.as_ref()],
            _ => Vec::new(),
        }
    }
}

fn join_children(children: &[Predicate], op: &str) -> String {
    let parts: Vec<String> = children.iter().map(Predicate::explain).collect();
    format!("({})", parts.join(op))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Strings are single-quoted; everything else prints as JSON.
fn value_repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.explain()).finish()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}

impl BitAnd for Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Predicate) -> Predicate {
        Predicate::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Predicate) -> Predicate {
        Predicate::Or(vec![self, rhs])
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}
