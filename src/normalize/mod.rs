//! Canonical normalization of field names and hierarchical values.
//!
//! Every descriptor value passes through [`normalize_value`] before it is
//! stored, so equality checks and hierarchy matching can work on plain
//! string comparison.

pub mod hierarchy;

use std::collections::BTreeMap;

use crate::types::{TagError, TagResult, HIERARCHY_ARROW, HIERARCHY_SEPARATOR};

pub use hierarchy::{get_depth, get_parent, get_path, get_root, is_descendant_or_self, is_hierarchical};

/// Separator spellings accepted on input, longest first so `->` wins over `>`.
pub const ALTERNATIVE_SEPARATORS: [&str; 5] = ["->", "→", ">", "/", "|"];

/// Lowercase a field name and join its words with `_`.
pub fn normalize_field_name(name: &str) -> String {
    name.to_lowercase().replace(['-', ' '], "_")
}

/// Rewrite every recognized separator spelling to the canonical separator.
///
/// Runs as a single left-to-right scan, so the arrow emitted for `->` is
/// never rewritten a second time.
pub fn normalize_hierarchy_separator(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    'scan: while let Some(ch) = rest.chars().next() {
        for alt in ALTERNATIVE_SEPARATORS {
            if let Some(tail) = rest.strip_prefix(alt) {
                out.push_str(HIERARCHY_SEPARATOR);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Collapse whitespace runs, strip the ends, and re-space canonical arrows.
pub fn normalize_whitespace(text: &str) -> String {
    let joined = text
        .split(HIERARCHY_ARROW)
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(HIERARCHY_SEPARATOR);
    joined.trim().to_string()
}

/// Bring a value into canonical form. Character case is always preserved.
///
/// In strict mode an empty result is a [`TagError::Normalization`]; in
/// non-strict mode the empty string is returned as-is.
pub fn normalize_value(value: &str, strict: bool) -> TagResult<String> {
    let result = normalize_whitespace(&normalize_hierarchy_separator(value));
    if strict && result.is_empty() {
        return Err(TagError::Normalization(format!(
            "Normalization produced empty string from input: '{value}'"
        )));
    }
    Ok(result)
}

/// Normalize a JSON value, rejecting anything that is not a string.
pub fn normalize_json_value(value: &serde_json::Value, strict: bool) -> TagResult<String> {
    match value {
        serde_json::Value::String(s) => normalize_value(s, strict),
        other => Err(TagError::Normalization(format!(
            "Value must be string, got {}",
            json_type_name(other)
        ))),
    }
}

/// Normalize every key and value of a descriptor map.
///
/// Two input keys that collapse to the same field name are an error in
/// strict mode; otherwise the later entry wins.
pub fn normalize_descriptor<I, K, V>(entries: I, strict: bool) -> TagResult<BTreeMap<String, String>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut normalized = BTreeMap::new();
    for (key, value) in entries {
        let field = normalize_field_name(key.as_ref());
        let value = normalize_value(value.as_ref(), strict)?;
        if normalized.contains_key(&field) {
            if strict {
                return Err(TagError::Normalization(format!(
                    "Duplicate field after normalization: '{}' and another field both normalize to '{field}'",
                    key.as_ref()
                )));
            }
            log::debug!("field '{field}' given twice, keeping the later value");
        }
        normalized.insert(field, value);
    }
    Ok(normalized)
}

/// Whether two raw values share a canonical form.
pub fn are_values_equivalent(a: &str, b: &str) -> bool {
    match (normalize_value(a, false), normalize_value(b, false)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
