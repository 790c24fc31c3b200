//! Path helpers over canonical hierarchical values.

use crate::types::HIERARCHY_SEPARATOR;

/// Split a canonical value into its trimmed path segments.
pub fn get_path(value: &str) -> Vec<&str> {
    if !is_hierarchical(value) {
        return vec![value];
    }
    value.split(HIERARCHY_SEPARATOR).map(str::trim).collect()
}

/// Number of segments (1 for a flat value).
pub fn get_depth(value: &str) -> usize {
    get_path(value).len()
}

/// Whether the value contains the canonical separator.
pub fn is_hierarchical(value: &str) -> bool {
    value.contains(HIERARCHY_SEPARATOR)
}

/// All but the last segment, or `None` at the root.
pub fn get_parent(value: &str) -> Option<String> {
    let path = get_path(value);
    if path.len() <= 1 {
        return None;
    }
    Some(path[..path.len() - 1].join(HIERARCHY_SEPARATOR))
}

/// The first segment.
pub fn get_root(value: &str) -> &str {
    get_path(value)[0]
}

/// `value` equals `path` or lies strictly below it.
///
/// The boundary is the separator itself: `Science` covers
/// `Science → Biology` but not `ScienceFiction`.
pub fn is_descendant_or_self(value: &str, path: &str) -> bool {
    match value.strip_prefix(path) {
        Some("") => true,
        Some(rest) => rest.starts_with(HIERARCHY_SEPARATOR),
        None => false,
    }
}
