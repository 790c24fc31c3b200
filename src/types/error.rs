//! Error types for the semantic-tags library.

use std::fmt;

use thiserror::Error;

/// All errors that can occur in the semantic-tags library.
#[derive(Error, Debug)]
pub enum TagError {
    /// A value or field name could not be brought into canonical form.
    #[error("Normalization failed: {0}")]
    Normalization(String),

    /// A schema document is malformed or internally inconsistent.
    #[error("Schema error: {message}{}", SourceSuffix(.source_file))]
    Schema {
        message: String,
        source_file: Option<String>,
    },

    /// A field document declares a version other than the one being built.
    #[error(
        "Schema version mismatch: expected '{expected}', but schema declares '{actual}'{}",
        SourceSuffix(.source_file)
    )]
    SchemaVersion {
        expected: String,
        actual: String,
        source_file: Option<String>,
    },

    /// No schema was loaded for the requested version.
    #[error("Unknown schema version: {0}")]
    UnknownSchemaVersion(String),

    /// A descriptor failed schema checks.
    #[error("{message}{}", ReportLines(.errors, .warnings))]
    Validation {
        message: String,
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    /// An index operation was rejected; the index is left unmodified.
    ///
    /// `errors` holds the schema validation errors when the rejection came
    /// from descriptor validation, and is empty otherwise.
    #[error("Indexing error: {message}")]
    Indexing { message: String, errors: Vec<String> },

    /// A query could not be executed.
    #[error("Query error: {0}")]
    Query(String),

    /// A descriptor could not be migrated between schema versions.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TagError {
    /// Build a schema error without a source file.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
            source_file: None,
        }
    }

    /// Build an indexing error that carries no validation errors.
    pub fn indexing(message: impl Into<String>) -> Self {
        Self::Indexing {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Attach a source file to schema errors; other variants pass through.
    pub fn in_file(self, file: impl Into<String>) -> Self {
        match self {
            Self::Schema {
                message,
                source_file: None,
            } => Self::Schema {
                message,
                source_file: Some(file.into()),
            },
            Self::SchemaVersion {
                expected,
                actual,
                source_file: None,
            } => Self::SchemaVersion {
                expected,
                actual,
                source_file: Some(file.into()),
            },
            other => other,
        }
    }

    /// Whether the object that produced this error is still usable.
    ///
    /// Schema and config failures are fatal at construction time; everything
    /// raised by an already-built index, query, or descriptor is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Normalization(_)
                | Self::Validation { .. }
                | Self::Indexing { .. }
                | Self::Query(_)
                | Self::Migration(_)
        )
    }
}

struct SourceSuffix<'a>(&'a Option<String>);

impl fmt::Display for SourceSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(file) => write!(f, " (in schema file: {file})"),
            None => Ok(()),
        }
    }
}

struct ReportLines<'a>(&'a [String], &'a [String]);

impl fmt::Display for ReportLines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReportLines(errors, warnings) = *self;
        if !errors.is_empty() {
            write!(f, "\n\nErrors:")?;
            for error in errors {
                write!(f, "\n  • {error}")?;
            }
        }
        if !warnings.is_empty() {
            write!(f, "\n\nWarnings:")?;
            for warning in warnings {
                write!(f, "\n  • {warning}")?;
            }
        }
        Ok(())
    }
}

/// Convenience result type for semantic-tags operations.
pub type TagResult<T> = Result<T, TagError>;
