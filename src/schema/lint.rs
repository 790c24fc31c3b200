//! Schema linting: checks stricter than what catalog construction enforces.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::document::{FieldDocument, RegistryDocument, ValueNode};

/// How serious a lint finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Warning,
    Error,
}

/// One lint finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub severity: LintSeverity,
    /// Document (or registry) the finding refers to.
    pub location: String,
    pub message: String,
}

impl LintIssue {
    fn error(location: &str, message: impl Into<String>) -> Self {
        Self {
            severity: LintSeverity::Error,
            location: location.to_string(),
            message: message.into(),
        }
    }

    fn warning(location: &str, message: impl Into<String>) -> Self {
        Self {
            severity: LintSeverity::Warning,
            location: location.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == LintSeverity::Error
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            LintSeverity::Warning => "warning",
            LintSeverity::Error => "error",
        };
        write!(f, "{tag}: {}: {}", self.location, self.message)
    }
}

/// Lint one field document.
///
/// Reports a missing description, an empty or version-mismatched document,
/// and any label repeated anywhere in the tree, even under different parents.
pub fn lint_field_document(field: &str, doc: &FieldDocument, expected_version: &str) -> Vec<LintIssue> {
    let location = format!("{field}.json");
    let mut issues = Vec::new();

    match &doc.version {
        None => issues.push(LintIssue::error(&location, "Missing required key: version")),
        Some(version) if version != expected_version => issues.push(LintIssue::error(
            &location,
            format!("Declares version '{version}', expected '{expected_version}'"),
        )),
        Some(_) => {}
    }
    if doc.description.trim().is_empty() {
        issues.push(LintIssue::warning(&location, "Missing description"));
    }
    if doc.values.is_empty() {
        issues.push(LintIssue::error(&location, "'values' is empty"));
    }

    let mut seen = BTreeSet::new();
    collect_duplicate_labels(&doc.values, &mut seen, &location, &mut issues);
    issues
}

fn collect_duplicate_labels<'a>(
    nodes: &'a [ValueNode],
    seen: &mut BTreeSet<&'a str>,
    location: &str,
    issues: &mut Vec<LintIssue>,
) {
    for node in nodes {
        let label = node.label();
        if !seen.insert(label) {
            issues.push(LintIssue::error(location, format!("Duplicate value detected: '{label}'")));
        }
        if let ValueNode::Branch { children, .. } = node {
            collect_duplicate_labels(children, seen, location, issues);
        }
    }
}

/// Check that every registry entry has a matching document.
///
/// `available` maps each version directory present to the document file
/// names it contains.
pub fn lint_registry(
    registry: &RegistryDocument,
    available: &BTreeMap<String, BTreeSet<String>>,
) -> Vec<LintIssue> {
    let mut issues = Vec::new();
    for (version, fields) in &registry.versions {
        let Some(files) = available.get(version) else {
            issues.push(LintIssue::error(
                "registry.json",
                format!("Registry references missing directory: {version}"),
            ));
            continue;
        };
        for field in fields {
            let file = registry.document_name(field);
            if !files.contains(&file) {
                issues.push(LintIssue::error(
                    "registry.json",
                    format!("Registry references missing schema: {version}/{file}"),
                ));
            }
        }
    }
    issues
}
