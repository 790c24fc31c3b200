//! Configuration with TOML persistence.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::index::IndexValidation;
use crate::schema::SchemaCatalog;
use crate::storage::{load_schema_root, FileAdapter, LoadPolicy, StorageFormat};
use crate::types::{TagError, TagResult, DEFAULT_SCHEMA_VERSION};

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Schema root directory (registry plus version directories).
    pub schema_root: Option<PathBuf>,

    /// Version descriptors are validated against
    pub schema_version: String,

    /// Validate descriptors on every index write
    pub validate_on_add: bool,

    /// Storage configuration
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Index file
    pub path: Option<PathBuf>,

    /// Encoding; detected from the file extension when unset
    pub format: Option<StorageFormat>,

    /// Save after every mutation
    pub auto_save: bool,

    /// Re-validate and re-deduplicate items on load
    pub revalidate_on_load: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            schema_root: None,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            validate_on_add: true,
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: None,
            auto_save: true,
            revalidate_on_load: false,
        }
    }
}

impl TagConfig {
    /// Load from TOML file
    pub fn load(path: &Path) -> TagResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| TagError::Config(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> TagResult<Self> {
        toml::from_str(content).map_err(|err| TagError::Config(err.to_string()))
    }

    /// Save to TOML file
    pub fn save(&self, path: &Path) -> TagResult<()> {
        let content = toml::to_string_pretty(self).map_err(|err| TagError::Config(err.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the configured schema root, if any.
    pub fn load_catalog(&self) -> TagResult<Option<Arc<SchemaCatalog>>> {
        match &self.schema_root {
            Some(root) => Ok(Some(Arc::new(load_schema_root(root)?))),
            None => Ok(None),
        }
    }

    /// Write-time validation, when enabled and a catalog is available.
    pub fn index_validation(&self, catalog: Option<Arc<SchemaCatalog>>) -> Option<IndexValidation> {
        if !self.validate_on_add {
            return None;
        }
        catalog.map(|catalog| IndexValidation::new(catalog, self.schema_version.clone()))
    }

    pub fn load_policy(&self, catalog: Option<Arc<SchemaCatalog>>) -> LoadPolicy {
        LoadPolicy::new(self.index_validation(catalog), self.storage.revalidate_on_load)
    }

    /// File adapter for the configured index path.
    pub fn file_adapter(&self, catalog: Option<Arc<SchemaCatalog>>) -> TagResult<FileAdapter> {
        let path = self
            .storage
            .path
            .clone()
            .ok_or_else(|| TagError::Config("No storage path configured".to_string()))?;
        Ok(FileAdapter::new(path, self.storage.format, self.load_policy(catalog)))
    }
}
