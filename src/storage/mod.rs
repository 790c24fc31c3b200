//! Persistence: item serialization, storage adapters, and schema files.
//!
//! Nothing here is needed to use an index in memory; adapters only ever
//! see snapshots and rebuild indexes through the bulk-load paths.

pub mod adapters;
pub mod manager;
pub mod schema_files;
pub mod serialize;

pub use adapters::{DirectoryAdapter, FileAdapter, LoadPolicy, MemoryAdapter, StorageAdapter};
pub use manager::IndexManager;
pub use schema_files::{
    lint_schema_root, load_schema_root, load_version_dir, read_field_document, read_registry, read_version_dir,
};
pub use serialize::{
    append_ndjson, from_json, from_ndjson, read_from, read_from_file, to_json, to_ndjson, write_to, write_to_file,
    StorageFormat,
};
