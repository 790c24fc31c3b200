//! Versioned catalog of permitted hierarchical values.

use std::collections::{BTreeMap, BTreeSet};

use crate::normalize::{normalize_field_name, normalize_value};
use crate::types::{TagError, TagResult, HIERARCHY_SEPARATOR};

use super::document::{parse_field_document, FieldDocument, RegistryDocument, ValueNode};
use super::report::ValidationReport;

static NO_VALUES: BTreeSet<String> = BTreeSet::new();

/// Suggestions shown when a similar value exists.
const MAX_SUGGESTIONS: usize = 5;

/// Allowed values listed when nothing similar exists.
const MAX_LISTED_VALUES: usize = 10;

/// One field's compiled schema: its value tree and flattened path set.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    name: String,
    version: String,
    required: bool,
    description: String,
    values: Vec<ValueNode>,
    paths: BTreeSet<String>,
}

impl FieldSchema {
    /// Compile a field document, flattening its value tree.
    ///
    /// Fails if the document declares another version, or if a label repeats
    /// a path already produced for this field.
    pub fn compile(name: &str, version: &str, doc: FieldDocument) -> TagResult<Self> {
        if let Some(declared) = &doc.version {
            if declared != version {
                return Err(TagError::SchemaVersion {
                    expected: version.to_string(),
                    actual: declared.clone(),
                    source_file: None,
                });
            }
        }
        let name = normalize_field_name(name);
        let mut paths = BTreeSet::new();
        flatten_values(&name, &doc.values, None, &mut paths)?;
        Ok(Self {
            name,
            version: version.to_string(),
            required: doc.required,
            description: doc.description,
            values: doc.values,
            paths,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The value tree as declared.
    pub fn values(&self) -> &[ValueNode] {
        &self.values
    }

    /// Every permitted canonical path.
    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn contains(&self, value: &str) -> bool {
        self.paths.contains(value)
    }
}

/// Depth-first flattening. Labels are normalized so schema paths compare
/// equal to normalized descriptor values.
fn flatten_values(
    field: &str,
    nodes: &[ValueNode],
    prefix: Option<&str>,
    paths: &mut BTreeSet<String>,
) -> TagResult<()> {
    for node in nodes {
        let label = normalize_value(node.label(), true).map_err(|_| {
            TagError::schema(format!("Empty value label in field '{field}'"))
        })?;
        let path = match prefix {
            Some(prefix) => format!("{prefix}{HIERARCHY_SEPARATOR}{label}"),
            None => label,
        };
        if !paths.insert(path.clone()) {
            return Err(TagError::schema(format!(
                "Duplicate value '{path}' in field '{field}'"
            )));
        }
        if let ValueNode::Branch { children, .. } = node {
            flatten_values(field, children, Some(&path), paths)?;
        }
    }
    Ok(())
}

/// All field schemas of one version.
#[derive(Debug, Clone)]
pub struct VersionSchema {
    version: String,
    fields: BTreeMap<String, FieldSchema>,
}

impl VersionSchema {
    /// Compile every document of a version. Any failure aborts the whole set.
    pub fn from_documents<I, K>(version: &str, documents: I) -> TagResult<Self>
    where
        I: IntoIterator<Item = (K, FieldDocument)>,
        K: AsRef<str>,
    {
        let mut fields = BTreeMap::new();
        for (name, doc) in documents {
            let schema = FieldSchema::compile(name.as_ref(), version, doc)?;
            if fields.contains_key(schema.name()) {
                return Err(TagError::schema(format!(
                    "Field '{}' declared twice in version '{version}'",
                    schema.name()
                )));
            }
            fields.insert(schema.name().to_string(), schema);
        }
        log::debug!("compiled schema {version} with {} fields", fields.len());
        Ok(Self {
            version: version.to_string(),
            fields,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(&normalize_field_name(name))
    }

    /// Known field names, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values()
    }

    /// Every permitted value of a field; empty if the field is unknown.
    pub fn valid_values(&self, field: &str) -> &BTreeSet<String> {
        self.field(field).map(FieldSchema::paths).unwrap_or(&NO_VALUES)
    }

    /// Fields marked `required`.
    pub fn required_fields(&self) -> BTreeSet<String> {
        self.fields
            .values()
            .filter(|schema| schema.required)
            .map(|schema| schema.name.clone())
            .collect()
    }

    fn known_fields(&self) -> String {
        self.field_names().collect::<Vec<_>>().join(", ")
    }

    /// Check one value against one field.
    pub fn validate_field(&self, field: &str, value: &str) -> ValidationReport {
        let Some(schema) = self.field(field) else {
            return ValidationReport::failed(format!(
                "Unknown field: '{field}'. Available fields: {}",
                self.known_fields()
            ));
        };
        if !schema.contains(value) {
            return ValidationReport::failed(self.explain_invalid(field, value));
        }
        ValidationReport::ok()
    }

    /// Human-readable reason a value is rejected, with suggestions.
    pub fn explain_invalid(&self, field: &str, value: &str) -> String {
        let Some(schema) = self.field(field) else {
            return format!(
                "The field '{field}' is not recognized. Available fields are: {}",
                self.known_fields()
            );
        };

        let needle = value.to_lowercase();
        let mut suggestions: Vec<&String> = schema
            .paths
            .iter()
            .filter(|candidate| candidate.to_lowercase().contains(&needle))
            .collect();
        if suggestions.is_empty() {
            let tokens: Vec<String> = value
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            suggestions = schema
                .paths
                .iter()
                .filter(|candidate| {
                    let candidate = candidate.to_lowercase();
                    tokens.iter().any(|token| candidate.contains(token.as_str()))
                })
                .collect();
        }

        let mut explanation = format!("The value '{value}' is not allowed for field '{field}'.\n\n");
        if !suggestions.is_empty() {
            explanation.push_str("Did you mean one of these?\n");
            for suggestion in suggestions.iter().take(MAX_SUGGESTIONS) {
                explanation.push_str(&format!("  • {suggestion}\n"));
            }
        } else {
            explanation.push_str(&format!("Allowed values for '{field}' include:\n"));
            for allowed in schema.paths.iter().take(MAX_LISTED_VALUES) {
                explanation.push_str(&format!("  • {allowed}\n"));
            }
            if schema.paths.len() > MAX_LISTED_VALUES {
                explanation.push_str(&format!(
                    "  ... and {} more\n",
                    schema.paths.len() - MAX_LISTED_VALUES
                ));
            }
        }
        explanation.trim().to_string()
    }

    /// Validate the values that are present; completeness is not checked.
    /// Unknown fields only produce a warning.
    pub fn validate_values(&self, descriptor: &BTreeMap<String, String>) -> ValidationReport {
        let mut report = ValidationReport::ok();
        let unknown: Vec<&str> = descriptor
            .keys()
            .filter(|field| self.field(field).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            log::warn!("ignoring unknown fields for schema {}: {unknown:?}", self.version);
            report
                .warnings
                .push(format!("Unknown fields will be ignored: {}", unknown.join(", ")));
        }
        for (field, value) in descriptor {
            if self.field(field).is_some() {
                report.absorb(self.validate_field(field, value));
            }
        }
        report
    }

    /// Validate values and require every required field to be present.
    pub fn validate_complete(&self, descriptor: &BTreeMap<String, String>) -> ValidationReport {
        let missing: Vec<String> = self
            .required_fields()
            .into_iter()
            .filter(|field| !descriptor.contains_key(field))
            .collect();
        let mut report = if missing.is_empty() {
            ValidationReport::ok()
        } else {
            ValidationReport::failed(format!("Missing required fields: {}", missing.join(", ")))
        };
        report.absorb(self.validate_values(descriptor));
        report
    }
}

/// Immutable mapping from schema version to its field schemas.
///
/// Built once through [`SchemaCatalogBuilder`] and passed by reference (or
/// `Arc`) to whatever needs validation; several versions may coexist.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    versions: BTreeMap<String, VersionSchema>,
}

impl SchemaCatalog {
    pub fn builder() -> SchemaCatalogBuilder {
        SchemaCatalogBuilder::default()
    }

    /// Catalog holding a single version.
    pub fn single(schema: VersionSchema) -> Self {
        let mut versions = BTreeMap::new();
        versions.insert(schema.version.clone(), schema);
        Self { versions }
    }

    /// Loaded version names, sorted.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    pub fn version(&self, version: &str) -> Option<&VersionSchema> {
        self.versions.get(version)
    }

    /// Like [`SchemaCatalog::version`], but an unknown version is an error.
    pub fn require_version(&self, version: &str) -> TagResult<&VersionSchema> {
        self.version(version)
            .ok_or_else(|| TagError::UnknownSchemaVersion(version.to_string()))
    }

    pub fn valid_values(&self, version: &str, field: &str) -> TagResult<&BTreeSet<String>> {
        Ok(self.require_version(version)?.valid_values(field))
    }

    pub fn required_fields(&self, version: &str) -> TagResult<BTreeSet<String>> {
        Ok(self.require_version(version)?.required_fields())
    }

    pub fn validate_field(&self, version: &str, field: &str, value: &str) -> TagResult<ValidationReport> {
        Ok(self.require_version(version)?.validate_field(field, value))
    }

    pub fn explain_invalid(&self, version: &str, field: &str, value: &str) -> TagResult<String> {
        Ok(self.require_version(version)?.explain_invalid(field, value))
    }

    pub fn validate_values(
        &self,
        version: &str,
        descriptor: &BTreeMap<String, String>,
    ) -> TagResult<ValidationReport> {
        Ok(self.require_version(version)?.validate_values(descriptor))
    }

    pub fn validate_complete(
        &self,
        version: &str,
        descriptor: &BTreeMap<String, String>,
    ) -> TagResult<ValidationReport> {
        Ok(self.require_version(version)?.validate_complete(descriptor))
    }
}

/// Collects field documents per version, then compiles them all at once.
#[derive(Debug, Default)]
pub struct SchemaCatalogBuilder {
    documents: BTreeMap<String, Vec<(String, FieldDocument)>>,
    registry: Option<RegistryDocument>,
}

impl SchemaCatalogBuilder {
    /// Add one field document to a version.
    pub fn field(mut self, version: impl Into<String>, field: impl Into<String>, doc: FieldDocument) -> Self {
        self.documents
            .entry(version.into())
            .or_default()
            .push((field.into(), doc));
        self
    }

    /// Parse and add a field document from JSON text.
    pub fn field_json(self, version: impl Into<String>, field: impl Into<String>, raw: &str) -> TagResult<Self> {
        let field = field.into();
        let doc = parse_field_document(raw).map_err(|err| err.in_file(format!("{field}.json")))?;
        Ok(self.field(version, field, doc))
    }

    /// Require every version to provide exactly the registry's declared fields.
    pub fn registry(mut self, registry: RegistryDocument) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Compile the catalog. Nothing is returned unless every document compiles.
    pub fn build(self) -> TagResult<SchemaCatalog> {
        if let Some(registry) = &self.registry {
            check_registry(registry, &self.documents)?;
        }
        let mut versions = BTreeMap::new();
        for (version, documents) in self.documents {
            let schema = VersionSchema::from_documents(&version, documents)?;
            versions.insert(version, schema);
        }
        log::info!("schema catalog built with versions {:?}", versions.keys().collect::<Vec<_>>());
        Ok(SchemaCatalog { versions })
    }
}

fn check_registry(
    registry: &RegistryDocument,
    documents: &BTreeMap<String, Vec<(String, FieldDocument)>>,
) -> TagResult<()> {
    for (version, fields) in &registry.versions {
        let provided: BTreeSet<String> = documents
            .get(version)
            .map(|docs| docs.iter().map(|(name, _)| normalize_field_name(name)).collect())
            .unwrap_or_default();
        for field in fields {
            if !provided.contains(&normalize_field_name(field)) {
                return Err(TagError::schema(format!(
                    "Registry declares field '{field}' for version '{version}' but no document provides it"
                )));
            }
        }
    }
    for version in documents.keys() {
        if !registry.versions.contains_key(version) {
            return Err(TagError::schema(format!(
                "Version '{version}' is not listed in the registry"
            )));
        }
    }
    Ok(())
}
