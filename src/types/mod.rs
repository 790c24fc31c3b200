//! All data types for the semantic-tags library.

pub mod descriptor;
pub mod error;
pub mod item;

pub use descriptor::{Descriptor, DescriptorBuilder};
pub use error::{TagError, TagResult};
pub use item::{content_hash, IndexedItem, Metadata};

/// Canonical token joining hierarchy path segments.
pub const HIERARCHY_SEPARATOR: &str = " → ";

/// The bare arrow inside [`HIERARCHY_SEPARATOR`].
pub const HIERARCHY_ARROW: char = '→';

/// The five standard descriptor fields, in display order.
pub const STANDARD_FIELDS: [&str; 5] = ["domain", "intent", "tone", "audience", "stability"];

/// Schema version used when none is configured.
pub const DEFAULT_SCHEMA_VERSION: &str = "v1";

/// Returns the current UTC time.
pub fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
