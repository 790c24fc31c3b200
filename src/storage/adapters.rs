//! Persistence backends for a [`TextIndex`].

use std::path::{Path, PathBuf};

use super::serialize::{append_ndjson, read_from_file, write_to_file, StorageFormat};
use crate::index::{IndexValidation, TextIndex};
use crate::types::{IndexedItem, TagError, TagResult};

/// How a loaded item list becomes an index.
#[derive(Debug, Clone, Default)]
pub struct LoadPolicy {
    /// Validation attached to the loaded index for later writes.
    pub validation: Option<IndexValidation>,
    /// Re-validate and re-deduplicate every loaded item instead of trusting
    /// the stored snapshot.
    pub revalidate: bool,
}

impl LoadPolicy {
    pub fn new(validation: Option<IndexValidation>, revalidate: bool) -> Self {
        Self { validation, revalidate }
    }

    pub fn build(&self, items: Vec<IndexedItem>) -> TagResult<TextIndex> {
        if self.revalidate {
            TextIndex::from_items_checked(items, self.validation.clone())
        } else {
            Ok(TextIndex::from_items(items, self.validation.clone()))
        }
    }

    pub fn empty(&self) -> TextIndex {
        TextIndex::from_items(Vec::new(), self.validation.clone())
    }
}

/// A place an index can be saved to and loaded from.
pub trait StorageAdapter {
    fn save(&mut self, index: &TextIndex) -> TagResult<()>;

    /// Load the stored index, or an empty one if nothing is stored.
    fn load(&self) -> TagResult<TextIndex>;

    fn exists(&self) -> bool;

    fn delete(&mut self) -> TagResult<()>;
}

/// Keeps a snapshot in memory. Useful for tests and ephemeral indexes.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    policy: LoadPolicy,
    stored: Option<Vec<IndexedItem>>,
}

impl MemoryAdapter {
    pub fn new(policy: LoadPolicy) -> Self {
        Self { policy, stored: None }
    }
}

impl StorageAdapter for MemoryAdapter {
    fn save(&mut self, index: &TextIndex) -> TagResult<()> {
        self.stored = Some(index.snapshot());
        Ok(())
    }

    fn load(&self) -> TagResult<TextIndex> {
        match &self.stored {
            Some(items) => self.policy.build(items.clone()),
            None => Ok(self.policy.empty()),
        }
    }

    fn exists(&self) -> bool {
        self.stored.is_some()
    }

    fn delete(&mut self) -> TagResult<()> {
        self.stored = None;
        Ok(())
    }
}

/// Stores the whole index in a single JSON or NDJSON file.
#[derive(Debug)]
pub struct FileAdapter {
    path: PathBuf,
    format: StorageFormat,
    policy: LoadPolicy,
}

impl FileAdapter {
    /// The format is detected from the extension when not given.
    pub fn new(path: impl Into<PathBuf>, format: Option<StorageFormat>, policy: LoadPolicy) -> Self {
        let path = path.into();
        let format = format.unwrap_or_else(|| StorageFormat::detect(&path));
        Self { path, format, policy }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    /// Append a single item without rewriting the file. NDJSON only.
    pub fn append(&self, item: &IndexedItem) -> TagResult<()> {
        if self.format != StorageFormat::Ndjson {
            return Err(TagError::indexing(
                "Append operation only supported for NDJSON format",
            ));
        }
        append_ndjson(item, &self.path)
    }
}

impl StorageAdapter for FileAdapter {
    fn save(&mut self, index: &TextIndex) -> TagResult<()> {
        write_to_file(&index.snapshot(), self.format, &self.path)?;
        log::info!("saved {} items to {}", index.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> TagResult<TextIndex> {
        if !self.exists() {
            return Ok(self.policy.empty());
        }
        let items = read_from_file(self.format, &self.path)?;
        log::info!("loaded {} items from {}", items.len(), self.path.display());
        self.policy.build(items)
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn delete(&mut self) -> TagResult<()> {
        if self.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Stores one file per item under a directory.
#[derive(Debug)]
pub struct DirectoryAdapter {
    directory: PathBuf,
    format: StorageFormat,
    policy: LoadPolicy,
}

impl DirectoryAdapter {
    pub fn new(directory: impl Into<PathBuf>, format: StorageFormat, policy: LoadPolicy) -> Self {
        Self {
            directory: directory.into(),
            format,
            policy,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn item_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.{}", self.format.extension()))
    }

    pub fn save_item(&self, item: &IndexedItem) -> TagResult<()> {
        write_to_file(std::slice::from_ref(item), self.format, &self.item_path(&item.id))
    }

    /// Remove one item's file. A missing file is not an error.
    pub fn delete_item(&self, id: &str) -> TagResult<()> {
        let path = self.item_path(id);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl StorageAdapter for DirectoryAdapter {
    fn save(&mut self, index: &TextIndex) -> TagResult<()> {
        std::fs::create_dir_all(&self.directory)?;
        for item in index.get_all() {
            self.save_item(item)?;
        }
        log::info!("saved {} item files to {}", index.len(), self.directory.display());
        Ok(())
    }

    /// Files are read in name order so loads are deterministic.
    fn load(&self) -> TagResult<TextIndex> {
        if !self.exists() {
            return Ok(self.policy.empty());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(self.format.extension())
            })
            .collect();
        paths.sort();

        let mut items = Vec::new();
        for path in paths {
            items.extend(read_from_file(self.format, &path)?);
        }
        self.policy.build(items)
    }

    fn exists(&self) -> bool {
        self.directory.is_dir()
    }

    fn delete(&mut self) -> TagResult<()> {
        if self.exists() {
            std::fs::remove_dir_all(&self.directory)?;
        }
        Ok(())
    }
}
