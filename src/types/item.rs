//! Indexed items: text paired with its descriptor.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::descriptor::Descriptor;

/// Free-form, string-keyed metadata (author, title, url, ...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Lowercase hex SHA-256 of the UTF-8 text (64 characters).
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A text paired with its semantic descriptor.
///
/// Owned by a [`crate::index::TextIndex`]; mutate only through the index so
/// `content_hash` and `updated_at` stay in step with the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    /// Unique identifier within the owning index.
    pub id: String,
    /// The text content.
    pub text: String,
    /// Normalized descriptor.
    pub descriptor: Descriptor,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// When the item was indexed.
    pub created_at: DateTime<Utc>,
    /// When the item last changed.
    pub updated_at: DateTime<Utc>,
    /// SHA-256 of `text`, used for deduplication.
    #[serde(default)]
    pub content_hash: String,
}

impl IndexedItem {
    /// Create an item stamped with the current time.
    pub fn new(id: impl Into<String>, text: impl Into<String>, descriptor: Descriptor, metadata: Metadata) -> Self {
        let text = text.into();
        let now = super::now();
        Self {
            id: id.into(),
            content_hash: content_hash(&text),
            text,
            descriptor,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recompute the hash if it is missing (older snapshots may omit it).
    pub(crate) fn ensure_hash(&mut self) {
        if self.content_hash.is_empty() {
            self.content_hash = content_hash(&self.text);
        }
    }

    /// Look up a descriptor field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.descriptor.get_field(name)
    }
}
