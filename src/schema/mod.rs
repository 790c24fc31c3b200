//! Versioned hierarchical schemas and descriptor validation.

pub mod catalog;
pub mod document;
pub mod lint;
pub mod report;

pub use catalog::{FieldSchema, SchemaCatalog, SchemaCatalogBuilder, VersionSchema};
pub use document::{
    field_document_from_value, parse_field_document, FieldDocument, FieldEntry, RegistryDocument, ValueNode,
};
pub use lint::{lint_field_document, lint_registry, LintIssue, LintSeverity};
pub use report::ValidationReport;
