//! The semantic descriptor: normalized standard and custom field values.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_descriptor, normalize_field_name, normalize_json_value, normalize_value};
use crate::schema::{SchemaCatalog, ValidationReport};
use crate::types::error::{TagError, TagResult};

/// Structured, controlled-vocabulary metadata describing a piece of content.
///
/// Every stored value is canonical. An absent field is `None` (or missing
/// from `custom`), never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, String>",
    try_from = "BTreeMap<String, String>"
)]
pub struct Descriptor {
    domain: Option<String>,
    intent: Option<String>,
    tone: Option<String>,
    audience: Option<String>,
    stability: Option<String>,
    custom: BTreeMap<String, String>,
}

impl Descriptor {
    /// Start building a descriptor field by field.
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// Construct from raw key/value pairs, normalizing everything at once.
    ///
    /// Any value that fails normalization (or a key collision) aborts the
    /// whole construction.
    pub fn from_pairs<I, K, V>(pairs: I) -> TagResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let normalized = normalize_descriptor(pairs, true)?;
        let mut descriptor = Self::default();
        for (field, value) in normalized {
            descriptor.put(field, value);
        }
        Ok(descriptor)
    }

    /// Construct from a JSON object; non-string values are rejected.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> TagResult<Self> {
        let mut pairs = Vec::with_capacity(map.len());
        for (key, value) in map {
            pairs.push((key.as_str(), normalize_json_value(value, true)?));
        }
        Self::from_pairs(pairs)
    }

    /// Parse a descriptor from a JSON object string.
    pub fn from_json_str(json: &str) -> TagResult<Self> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Object(map) => Self::from_json_map(&map),
            other => Err(TagError::Normalization(format!(
                "Descriptor must be a JSON object, got {}",
                crate::normalize::json_type_name(&other)
            ))),
        }
    }

    /// Case-insensitive lookup across standard and custom fields.
    pub fn get_field(&self, name: &str) -> Option<&str> {
        let field = normalize_field_name(name);
        match self.standard_slot(&field) {
            Some(slot) => slot.as_deref(),
            None => self.custom.get(&field).map(String::as_str),
        }
    }

    /// Normalize and store a value under a normalized field name.
    pub fn set_field(&mut self, name: &str, value: &str) -> TagResult<()> {
        let value = normalize_value(value, true)?;
        self.put(normalize_field_name(name), value);
        Ok(())
    }

    /// Remove a field, returning its previous value.
    pub fn clear_field(&mut self, name: &str) -> Option<String> {
        let field = normalize_field_name(name);
        match self.standard_slot_mut(&field) {
            Some(slot) => slot.take(),
            None => self.custom.remove(&field),
        }
    }

    /// Names of every field that currently holds a value.
    pub fn filled_fields(&self) -> BTreeSet<String> {
        self.to_map().into_keys().collect()
    }

    /// Custom (non-standard) fields.
    pub fn custom_fields(&self) -> &BTreeMap<String, String> {
        &self.custom
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref()
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    pub fn stability(&self) -> Option<&str> {
        self.stability.as_deref()
    }

    /// Flat field map of every present value.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.custom.clone();
        for (name, slot) in self.standard_slots() {
            if let Some(value) = slot {
                map.insert(name.to_string(), value.clone());
            }
        }
        map
    }

    /// Pretty JSON object of the present fields.
    pub fn to_json(&self) -> TagResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_map())?)
    }

    /// Validate against one schema version of the catalog.
    ///
    /// `partial` checks only the values present; otherwise required fields
    /// must be filled as well.
    pub fn validate(
        &self,
        catalog: &SchemaCatalog,
        version: &str,
        partial: bool,
    ) -> TagResult<ValidationReport> {
        let schema = catalog.require_version(version)?;
        let map = self.to_map();
        Ok(if partial {
            schema.validate_values(&map)
        } else {
            schema.validate_complete(&map)
        })
    }

    pub fn is_valid(&self, catalog: &SchemaCatalog, version: &str, partial: bool) -> TagResult<bool> {
        Ok(self.validate(catalog, version, partial)?.valid)
    }

    /// Like [`Descriptor::validate`], but a failing report becomes an error.
    pub fn validate_or_raise(&self, catalog: &SchemaCatalog, version: &str, partial: bool) -> TagResult<()> {
        self.validate(catalog, version, partial)?
            .into_result("Descriptor validation failed")
    }

    /// Whether every required field of the version is filled.
    pub fn is_complete(&self, catalog: &SchemaCatalog, version: &str) -> TagResult<bool> {
        let required = catalog.require_version(version)?.required_fields();
        let filled = self.filled_fields();
        Ok(required.iter().all(|field| filled.contains(field.as_str())))
    }

    fn put(&mut self, field: String, value: String) {
        match self.standard_slot_mut(&field) {
            Some(slot) => *slot = Some(value),
            None => {
                self.custom.insert(field, value);
            }
        }
    }

    fn standard_slots(&self) -> [(&'static str, &Option<String>); 5] {
        [
            ("domain", &self.domain),
            ("intent", &self.intent),
            ("tone", &self.tone),
            ("audience", &self.audience),
            ("stability", &self.stability),
        ]
    }

    fn standard_slot(&self, field: &str) -> Option<&Option<String>> {
        self.standard_slots()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, slot)| slot)
    }

    fn standard_slot_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "domain" => Some(&mut self.domain),
            "intent" => Some(&mut self.intent),
            "tone" => Some(&mut self.tone),
            "audience" => Some(&mut self.audience),
            "stability" => Some(&mut self.stability),
            _ => None,
        }
    }
}

impl From<Descriptor> for BTreeMap<String, String> {
    fn from(descriptor: Descriptor) -> Self {
        descriptor.to_map()
    }
}

impl TryFrom<BTreeMap<String, String>> for Descriptor {
    type Error = TagError;

    fn try_from(map: BTreeMap<String, String>) -> TagResult<Self> {
        Self::from_pairs(map)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = Vec::new();
        for (name, slot) in self.standard_slots() {
            if let Some(value) = slot {
                fields.push(format!("{name}: {value}"));
            }
        }
        for (name, value) in &self.custom {
            fields.push(format!("{name}: {value}"));
        }
        write!(f, "Descriptor({})", fields.join(", "))
    }
}

/// Builder for constructing [`Descriptor`] instances ergonomically.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    pairs: Vec<(String, String)>,
}

impl DescriptorBuilder {
    pub fn domain(self, value: impl Into<String>) -> Self {
        self.field("domain", value)
    }

    pub fn intent(self, value: impl Into<String>) -> Self {
        self.field("intent", value)
    }

    pub fn tone(self, value: impl Into<String>) -> Self {
        self.field("tone", value)
    }

    pub fn audience(self, value: impl Into<String>) -> Self {
        self.field("audience", value)
    }

    pub fn stability(self, value: impl Into<String>) -> Self {
        self.field("stability", value)
    }

    /// Set any field by name; standard names land in their standard slot.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        match self.pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((name, value)),
        }
        self
    }

    /// Alias of [`DescriptorBuilder::field`] for non-standard fields.
    pub fn custom(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, value)
    }

    /// Normalize all collected values and build the descriptor.
    pub fn build(self) -> TagResult<Descriptor> {
        Descriptor::from_pairs(self.pairs)
    }
}
