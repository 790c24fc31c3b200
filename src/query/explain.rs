//! Human-readable explanations of queries and their results.

use std::collections::{BTreeMap, BTreeSet};

use super::builder::QueryResult;
use super::predicate::Predicate;
use crate::types::{IndexedItem, STANDARD_FIELDS};

/// Values shown per field in a distribution.
const TOP_VALUES: usize = 5;

/// Characters of text shown in a result summary.
const PREVIEW_CHARS: usize = 60;

/// Sentence describing a query's selection, order, and paging.
pub fn explain_query(
    predicate: Option<&Predicate>,
    limit: Option<usize>,
    offset: usize,
    sort_key: Option<&str>,
    descending: bool,
) -> String {
    let mut parts = vec![match predicate {
        Some(predicate) => format!("Select items where {}", predicate.explain()),
        None => "Select all items".to_string(),
    }];

    if let Some(key) = sort_key {
        let direction = if descending { "descending" } else { "ascending" };
        parts.push(format!("sorted by {key} ({direction})"));
    }

    match (offset, limit) {
        (0, None) | (0, Some(0)) => {}
        (0, Some(limit)) => parts.push(format!("limited to {limit} results")),
        (offset, Some(limit)) if limit > 0 => {
            parts.push(format!("showing results {} to {}", offset + 1, offset + limit))
        }
        (offset, _) => parts.push(format!("skipping first {offset} results")),
    }

    format!("{}.", parts.join(", "))
}

/// Count of each standard field's values, most common first.
///
/// Fields with no values among the items are omitted. Ties are broken by
/// value so the output is deterministic.
pub fn field_distribution(items: &[&IndexedItem]) -> BTreeMap<String, Vec<(String, usize)>> {
    let mut distribution = BTreeMap::new();
    for field in STANDARD_FIELDS {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for item in items {
            if let Some(value) = item.field(field) {
                *counts.entry(value).or_default() += 1;
            }
        }
        if counts.is_empty() {
            continue;
        }
        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        distribution.insert(field.to_string(), ranked);
    }
    distribution
}

/// Summary of a result; `verbose` adds the field distribution.
pub fn explain_result(result: &QueryResult<'_>, verbose: bool) -> String {
    let mut out = format!("Query: {}\nFound {} matching items", result.query_explanation, result.total);
    if result.items.len() < result.total {
        out.push_str(&format!(" (showing {})", result.items.len()));
    }

    if verbose && !result.items.is_empty() {
        out.push_str("\n\nField Distribution:");
        let shown = result.items.len() as f64;
        let distribution = field_distribution(&result.items);
        for field in STANDARD_FIELDS {
            let Some(values) = distribution.get(field) else {
                continue;
            };
            out.push_str(&format!("\n  {field}:"));
            for (value, count) in values.iter().take(TOP_VALUES) {
                let percentage = *count as f64 / shown * 100.0;
                out.push_str(&format!("\n    • {value}: {count} ({percentage:.1}%)"));
            }
        }
    }
    out
}

/// Indented tree of a predicate's combinators.
pub fn explain_predicate_tree(predicate: &Predicate) -> String {
    let mut lines = Vec::new();
    tree_lines(predicate, 0, &mut lines);
    lines.join("\n")
}

fn tree_lines(predicate: &Predicate, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let label = match predicate {
        Predicate::And(_) => "AND:",
        Predicate::Or(_) => "OR:",
        Predicate::Not(_) => "NOT:",
        leaf => {
            lines.push(format!("{indent}• {}", leaf.explain()));
            return;
        }
    };
    lines.push(format!("{indent}{label}"));
    for child in predicate.children() {
        tree_lines(child, depth + 1, lines);
    }
}

/// Numbered preview of up to `max_items` items.
pub fn summarize_results(items: &[&IndexedItem], max_items: usize) -> String {
    if items.is_empty() {
        return "No items found.".to_string();
    }

    let mut lines = vec![format!("Found {} items:\n", items.len())];
    for (n, item) in items.iter().take(max_items).enumerate() {
        let preview: String = item.text.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if item.text.chars().count() > PREVIEW_CHARS { "..." } else { "" };
        lines.push(format!("{}. {preview}{ellipsis}", n + 1));

        let mut tags = Vec::new();
        if let Some(domain) = item.descriptor.domain() {
            tags.push(format!("domain: {domain}"));
        }
        if let Some(intent) = item.descriptor.intent() {
            tags.push(format!("intent: {intent}"));
        }
        if !tags.is_empty() {
            lines.push(format!("   [{}]", tags.join(", ")));
        }
        lines.push(String::new());
    }
    if items.len() > max_items {
        lines.push(format!("... and {} more items", items.len() - max_items));
    }
    lines.join("\n")
}

/// Side-by-side totals and id overlap of two results.
pub fn compare_results(first: &QueryResult<'_>, second: &QueryResult<'_>) -> String {
    let a: BTreeSet<&str> = first.ids().into_iter().collect();
    let b: BTreeSet<&str> = second.ids().into_iter().collect();
    [
        "Query Comparison:\n".to_string(),
        "Query 1:".to_string(),
        format!("  {}", first.query_explanation),
        format!("  Results: {} items\n", first.total),
        "Query 2:".to_string(),
        format!("  {}", second.query_explanation),
        format!("  Results: {} items\n", second.total),
        "Overlap:".to_string(),
        format!("  Common items: {}", a.intersection(&b).count()),
        format!("  Only in Query 1: {}", a.difference(&b).count()),
        format!("  Only in Query 2: {}", b.difference(&a).count()),
    ]
    .join("\n")
}

/// Which conditions an item satisfied, or failed, under a predicate.
pub fn explain_match(item: &IndexedItem, predicate: Option<&Predicate>) -> String {
    let Some(predicate) = predicate else {
        return format!("Item {} matched because no filter was applied.", item.id);
    };
    let matched = predicate.test(item);
    let mut lines = vec![if matched {
        format!("Item {} matched because:\n", item.id)
    } else {
        format!("Item {} did NOT match because:\n", item.id)
    }];
    match_lines(item, predicate, matched, 0, &mut lines);
    lines.join("\n")
}

fn match_lines(item: &IndexedItem, predicate: &Predicate, matched: bool, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match predicate {
        Predicate::And(children) if matched => {
            lines.push(format!("{indent}All of the following were true:"));
            for child in children {
                match_lines(item, child, true, depth + 1, lines);
            }
        }
        Predicate::And(children) => {
            lines.push(format!("{indent}The following conditions failed:"));
            for child in children.iter().filter(|child| !child.test(item)) {
                match_lines(item, child, false, depth + 1, lines);
            }
        }
        Predicate::Or(children) if matched => {
            lines.push(format!("{indent}At least one of the following was true:"));
            if let Some(child) = children.iter().find(|child| child.test(item)) {
                match_lines(item, child, true, depth + 1, lines);
            }
        }
        Predicate::Or(children) => {
            lines.push(format!("{indent}None of the following were true:"));
            for child in children {
                match_lines(item, child, false, depth + 1, lines);
            }
        }
        Predicate::FieldEquals { field, value } if !matched => lines.push(format!(
            "{indent}• {field} = '{}' (expected '{value}')",
            item.field(field).unwrap_or_default()
        )),
        Predicate::HierarchyMatches { field, path, .. } if !matched => lines.push(format!(
            "{indent}• {field} = '{}' (expected under '{path}')",
            item.field(field).unwrap_or_default()
        )),
        Predicate::HierarchyMatches { field, .. } => lines.push(format!(
            "{indent}• {field} = '{}' (hierarchy match)",
            item.field(field).unwrap_or_default()
        )),
        other if matched => lines.push(format!("{indent}• {}", other.explain())),
        other => lines.push(format!("{indent}• {} was false", other.explain())),
    }
}
