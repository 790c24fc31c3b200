//! Validation results.

use std::fmt;

use serde::Serialize;

use crate::types::{TagError, TagResult};

/// Outcome of a validation run. `valid` is true iff `errors` is empty;
/// warnings never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// A passing report with no messages.
    pub fn ok() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// A failing report with a single error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::new(vec![error.into()], Vec::new())
    }

    /// Fold another report's messages into this one.
    pub fn absorb(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.valid = self.errors.is_empty();
    }

    /// Turn a failing report into [`TagError::Validation`].
    pub fn into_result(self, message: &str) -> TagResult<()> {
        if self.valid {
            return Ok(());
        }
        Err(TagError::Validation {
            message: message.to_string(),
            errors: self.errors,
            warnings: self.warnings,
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "✓ Validation passed")?;
            if !self.warnings.is_empty() {
                write!(f, " (with {} warnings)", self.warnings.len())?;
            }
            return Ok(());
        }
        write!(f, "✗ Validation failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  • {error}")?;
        }
        if !self.warnings.is_empty() {
            write!(f, "\n\nWarnings:")?;
            for warning in &self.warnings {
                write!(f, "\n  • {warning}")?;
            }
        }
        Ok(())
    }
}
