//! Semantic tags — controlled-vocabulary descriptors for text content.
//!
//! Values are normalized into a canonical hierarchical form, validated
//! against versioned schemas, stored in an in-memory index with
//! content-hash deduplication, and selected with composable boolean
//! predicates. No ranking, scoring, or inference is performed anywhere.

pub mod cli;
pub mod config;
pub mod index;
pub mod migrate;
pub mod normalize;
pub mod query;
pub mod schema;
pub mod storage;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{StorageConfig, TagConfig};
pub use index::{AddOptions, IndexValidation, ItemUpdate, TextIndex};
pub use migrate::{migrate_and_validate, migrate_descriptor, MigrationOutcome};
pub use normalize::{
    are_values_equivalent, normalize_descriptor, normalize_field_name, normalize_hierarchy_separator,
    normalize_value, normalize_whitespace,
};
pub use query::{Filter, Predicate, QueryBuilder, QueryResult};
pub use schema::{
    FieldDocument, FieldSchema, RegistryDocument, SchemaCatalog, SchemaCatalogBuilder, ValidationReport, ValueNode,
    VersionSchema,
};
pub use storage::{DirectoryAdapter, FileAdapter, IndexManager, LoadPolicy, MemoryAdapter, StorageAdapter, StorageFormat};
pub use types::{
    content_hash, now, Descriptor, DescriptorBuilder, IndexedItem, Metadata, TagError, TagResult,
    DEFAULT_SCHEMA_VERSION, HIERARCHY_SEPARATOR, STANDARD_FIELDS,
};
