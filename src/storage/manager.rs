//! Index plus adapter, with lazy loading and optional auto-save.

use super::adapters::StorageAdapter;
use crate::index::{AddOptions, ItemUpdate, TextIndex};
use crate::types::{Descriptor, IndexedItem, Metadata, TagResult};

/// Owns a [`TextIndex`] backed by a [`StorageAdapter`].
///
/// The index is loaded on first use. With `auto_save`, every successful
/// mutation is written back immediately.
#[derive(Debug)]
pub struct IndexManager<A: StorageAdapter> {
    adapter: A,
    auto_save: bool,
    index: Option<TextIndex>,
}

impl<A: StorageAdapter> IndexManager<A> {
    pub fn new(adapter: A, auto_save: bool) -> Self {
        Self {
            adapter,
            auto_save,
            index: None,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// The managed index, loading it if needed.
    pub fn index(&mut self) -> TagResult<&mut TextIndex> {
        if self.index.is_none() {
            self.index = Some(self.adapter.load()?);
        }
        Ok(self.index.get_or_insert_with(TextIndex::new))
    }

    pub fn add(
        &mut self,
        text: impl Into<String>,
        descriptor: Descriptor,
        metadata: Metadata,
        options: AddOptions,
    ) -> TagResult<IndexedItem> {
        let item = self.index()?.add(text, descriptor, metadata, options)?.clone();
        self.persist()?;
        Ok(item)
    }

    pub fn get(&mut self, id: &str) -> TagResult<Option<IndexedItem>> {
        Ok(self.index()?.get(id).cloned())
    }

    pub fn remove(&mut self, id: &str) -> TagResult<bool> {
        let removed = self.index()?.remove(id);
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn update(&mut self, id: &str, update: ItemUpdate) -> TagResult<Option<IndexedItem>> {
        let item = self.index()?.update(id, update)?.cloned();
        if item.is_some() {
            self.persist()?;
        }
        Ok(item)
    }

    pub fn len(&mut self) -> TagResult<usize> {
        Ok(self.index()?.len())
    }

    pub fn clear(&mut self) -> TagResult<()> {
        self.index()?.clear();
        self.persist()
    }

    /// Write the index through the adapter, loading it first if needed.
    pub fn save(&mut self) -> TagResult<()> {
        self.index()?;
        match &self.index {
            Some(index) => self.adapter.save(index),
            None => Ok(()),
        }
    }

    /// Discard in-memory state and load again from the adapter.
    pub fn reload(&mut self) -> TagResult<()> {
        self.index = Some(self.adapter.load()?);
        Ok(())
    }

    fn persist(&mut self) -> TagResult<()> {
        if self.auto_save {
            self.save()?;
        }
        Ok(())
    }
}
