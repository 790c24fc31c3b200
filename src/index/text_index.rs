//! In-memory collection of indexed texts with content-hash deduplication.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::schema::SchemaCatalog;
use crate::types::{content_hash, now, Descriptor, IndexedItem, Metadata, TagError, TagResult};

/// Schema validation applied on every write.
#[derive(Debug, Clone)]
pub struct IndexValidation {
    pub catalog: Arc<SchemaCatalog>,
    pub version: String,
}

impl IndexValidation {
    pub fn new(catalog: Arc<SchemaCatalog>, version: impl Into<String>) -> Self {
        Self {
            catalog,
            version: version.into(),
        }
    }

    /// Complete (non-partial) validation; failures become [`TagError::Indexing`]
    /// carrying the report's errors.
    fn check(&self, descriptor: &Descriptor) -> TagResult<()> {
        let report = descriptor.validate(&self.catalog, &self.version, false)?;
        if report.valid {
            return Ok(());
        }
        Err(TagError::Indexing {
            message: format!("Descriptor validation failed: {}", report.errors.join("; ")),
            errors: report.errors,
        })
    }
}

/// Options for [`TextIndex::add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Caller-supplied id; a UUID v4 is generated when absent.
    pub id: Option<String>,
    /// Accept text whose content hash is already indexed.
    pub allow_duplicates: bool,
}

impl AddOptions {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            allow_duplicates: false,
        }
    }

    pub fn allow_duplicates(mut self) -> Self {
        self.allow_duplicates = true;
        self
    }
}

/// Changes for [`TextIndex::update`]. Unset parts are left alone.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub text: Option<String>,
    pub descriptor: Option<Descriptor>,
    /// Merged into the existing metadata; old keys are kept.
    pub metadata: Option<Metadata>,
}

impl ItemUpdate {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    item: IndexedItem,
}

/// Identity-addressed collection of indexed texts.
///
/// Lookups by id and by content hash are O(1); every filter is a linear
/// scan. Items come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    items: HashMap<String, Slot>,
    order: BTreeMap<u64, String>,
    hash_to_id: HashMap<String, String>,
    next_seq: u64,
    validation: Option<IndexValidation>,
}

impl TextIndex {
    /// An index that accepts any descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index that validates every descriptor written to it.
    pub fn with_validation(validation: IndexValidation) -> Self {
        Self {
            validation: Some(validation),
            ..Self::default()
        }
    }

    pub fn validation(&self) -> Option<&IndexValidation> {
        self.validation.as_ref()
    }

    pub fn set_validation(&mut self, validation: Option<IndexValidation>) {
        self.validation = validation;
    }

    /// Bulk-load trusted items: no validation and no duplicate rejection.
    ///
    /// The hash map is rebuilt from scratch; if two items share content the
    /// later one owns the mapping, and a repeated id replaces the earlier item.
    pub fn from_items<I>(items: I, validation: Option<IndexValidation>) -> Self
    where
        I: IntoIterator<Item = IndexedItem>,
    {
        let mut index = Self {
            validation,
            ..Self::default()
        };
        for mut item in items {
            item.ensure_hash();
            if let Some(previous) = index.items.get(&item.id) {
                let previous_hash = previous.item.content_hash.clone();
                index.drop_hash(&previous_hash, &item.id);
            }
            index.hash_to_id.insert(item.content_hash.clone(), item.id.clone());
            index.put(item);
        }
        log::debug!("bulk-loaded {} items", index.len());
        index
    }

    /// Bulk-load untrusted items, validating each descriptor and rejecting
    /// duplicate content or ids. Nothing is returned unless every item passes.
    pub fn from_items_checked<I>(items: I, validation: Option<IndexValidation>) -> TagResult<Self>
    where
        I: IntoIterator<Item = IndexedItem>,
    {
        let mut index = Self {
            validation,
            ..Self::default()
        };
        for mut item in items {
            if let Some(validation) = &index.validation {
                validation.check(&item.descriptor)?;
            }
            item.content_hash = content_hash(&item.text);
            if index.items.contains_key(&item.id) {
                return Err(TagError::indexing(format!("Duplicate id in input: {}", item.id)));
            }
            if let Some(existing) = index.hash_to_id.get(&item.content_hash) {
                return Err(TagError::indexing(format!(
                    "Duplicate content detected (existing id: {existing})"
                )));
            }
            index.hash_to_id.insert(item.content_hash.clone(), item.id.clone());
            index.put(item);
        }
        Ok(index)
    }

    /// Index a text with its descriptor.
    ///
    /// Fails with [`TagError::Indexing`] if validation is enabled and the
    /// descriptor is incomplete or invalid, or if the content is already
    /// indexed and duplicates are not allowed. A caller-supplied id that is
    /// already present is overwritten in place.
    pub fn add(
        &mut self,
        text: impl Into<String>,
        descriptor: Descriptor,
        metadata: Metadata,
        options: AddOptions,
    ) -> TagResult<&IndexedItem> {
        if let Some(validation) = &self.validation {
            validation.check(&descriptor)?;
        }

        let text = text.into();
        let hash = content_hash(&text);
        if !options.allow_duplicates {
            if let Some(existing) = self.hash_to_id.get(&hash) {
                return Err(TagError::indexing(format!(
                    "Duplicate content detected (existing id: {existing})"
                )));
            }
        }

        let id = options.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if let Some(previous) = self.items.get(&id) {
            log::warn!("overwriting indexed item {id}");
            let previous_hash = previous.item.content_hash.clone();
            self.drop_hash(&previous_hash, &id);
        }

        let item = IndexedItem::new(id.clone(), text, descriptor, metadata);
        self.hash_to_id.entry(hash).or_insert_with(|| id.clone());
        log::debug!("indexed item {id}");
        Ok(self.put(item))
    }

    pub fn get(&self, id: &str) -> Option<&IndexedItem> {
        self.items.get(id).map(|slot| &slot.item)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Id currently owning a content hash.
    ///
    /// The first item indexed with a given text owns its hash; when the owner
    /// leaves, ownership passes to the oldest remaining item with that text.
    pub fn id_for_hash(&self, hash: &str) -> Option<&str> {
        self.hash_to_id.get(hash).map(String::as_str)
    }

    /// Remove an item and its hash mapping. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(slot) = self.items.remove(id) else {
            return false;
        };
        self.order.remove(&slot.seq);
        self.drop_hash(&slot.item.content_hash, id);
        log::debug!("removed item {id}");
        true
    }

    /// Apply an update. A missing id yields `Ok(None)`.
    ///
    /// The new descriptor is validated before anything changes, so a failed
    /// update leaves the item untouched.
    pub fn update(&mut self, id: &str, update: ItemUpdate) -> TagResult<Option<&IndexedItem>> {
        if !self.items.contains_key(id) {
            return Ok(None);
        }
        if let (Some(validation), Some(descriptor)) = (&self.validation, &update.descriptor) {
            validation.check(descriptor)?;
        }

        if let Some(text) = update.text {
            let hash = content_hash(&text);
            let old_hash = match self.items.get_mut(id) {
                Some(slot) => {
                    slot.item.text = text;
                    slot.item.updated_at = now();
                    std::mem::replace(&mut slot.item.content_hash, hash.clone())
                }
                None => return Ok(None),
            };
            self.drop_hash(&old_hash, id);
            self.hash_to_id.entry(hash).or_insert_with(|| id.to_string());
        }

        let Some(slot) = self.items.get_mut(id) else {
            return Ok(None);
        };
        if let Some(descriptor) = update.descriptor {
            slot.item.descriptor = descriptor;
            slot.item.updated_at = now();
        }
        if let Some(metadata) = update.metadata {
            slot.item.metadata.extend(metadata);
            slot.item.updated_at = now();
        }
        log::debug!("updated item {id}");
        Ok(Some(&slot.item))
    }

    /// Items whose field equals `value` exactly.
    pub fn filter_by_field(&self, field: &str, value: &str) -> Vec<&IndexedItem> {
        self.items()
            .filter(|item| item.field(field) == Some(value))
            .collect()
    }

    /// Items matching every `(field, value)` pair.
    pub fn filter_by_fields(&self, filters: &BTreeMap<String, String>) -> Vec<&IndexedItem> {
        self.items()
            .filter(|item| {
                filters
                    .iter()
                    .all(|(field, value)| item.field(field) == Some(value.as_str()))
            })
            .collect()
    }

    /// Items whose field is `prefix` or lies beneath it in the hierarchy.
    pub fn filter_by_prefix(&self, field: &str, prefix: &str) -> Vec<&IndexedItem> {
        self.items()
            .filter(|item| {
                item.field(field)
                    .is_some_and(|value| crate::normalize::is_descendant_or_self(value, prefix))
            })
            .collect()
    }

    /// Every item, in insertion order.
    pub fn get_all(&self) -> Vec<&IndexedItem> {
        self.items().collect()
    }

    /// Owned copies of every item, in insertion order.
    pub fn snapshot(&self) -> Vec<IndexedItem> {
        self.items().cloned().collect()
    }

    /// Distinct values of a field across all items.
    pub fn get_field_values(&self, field: &str) -> BTreeSet<String> {
        self.items()
            .filter_map(|item| item.field(field))
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.hash_to_id.clear();
    }

    fn items(&self) -> impl Iterator<Item = &IndexedItem> {
        self.order
            .values()
            .filter_map(|id| self.items.get(id).map(|slot| &slot.item))
    }

    /// Store an item, keeping the position of an existing slot with its id.
    fn put(&mut self, item: IndexedItem) -> &IndexedItem {
        match self.items.entry(item.id.clone()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                slot.item = item;
                &slot.item
            }
            Entry::Vacant(entry) => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.order.insert(seq, item.id.clone());
                &entry.insert(Slot { seq, item }).item
            }
        }
    }

    /// Release `id`'s claim on `hash`, handing it to a surviving holder.
    fn drop_hash(&mut self, hash: &str, id: &str) {
        if !self.hash_to_id.get(hash).is_some_and(|owner| owner == id) {
            return;
        }
        let heir = self
            .items()
            .find(|item| item.id != id && item.content_hash == hash)
            .map(|item| item.id.clone());
        match heir {
            Some(heir) => {
                self.hash_to_id.insert(hash.to_string(), heir);
            }
            None => {
                self.hash_to_id.remove(hash);
            }
        }
    }
}
