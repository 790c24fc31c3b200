//! CLI command implementations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::config::TagConfig;
use crate::index::{AddOptions, TextIndex};
use crate::migrate::migrate_and_validate;
use crate::normalize::normalize_value;
use crate::query::{field_distribution, QueryBuilder};
use crate::schema::SchemaCatalog;
use crate::storage::{lint_schema_root, load_schema_root, FileAdapter, IndexManager, StorageAdapter};
use crate::types::{Descriptor, IndexedItem, Metadata, TagError, TagResult};

/// Characters of text shown per item in text output.
const PREVIEW_CHARS: usize = 80;

/// Sort key accepted by `query --sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Created,
    Updated,
}

impl SortField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "created" | "created_at" => Some(Self::Created),
            "updated" | "updated_at" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// Filters and paging for `query`.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub domain: Option<String>,
    pub intent: Option<String>,
    pub fields: Vec<(String, String)>,
    pub text: Option<String>,
    pub meta: Vec<(String, String)>,
    pub sort: Option<SortField>,
    pub ascending: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Parse a `--meta` value: JSON when it parses as JSON, otherwise a string.
pub fn parse_meta_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn load_catalog(config: &TagConfig) -> TagResult<Option<Arc<SchemaCatalog>>> {
    let catalog = config.load_catalog()?;
    if catalog.is_none() && config.validate_on_add {
        log::warn!("no schema root configured; descriptors will not be validated");
    }
    Ok(catalog)
}

fn open_index(config: &TagConfig, path: &Path) -> TagResult<IndexManager<FileAdapter>> {
    let mut config = config.clone();
    config.storage.path = Some(path.to_path_buf());
    let adapter = config.file_adapter(load_catalog(&config)?)?;
    Ok(IndexManager::new(adapter, config.storage.auto_save))
}

fn read_index(config: &TagConfig, path: &Path) -> TagResult<TextIndex> {
    let mut config = config.clone();
    config.storage.path = Some(path.to_path_buf());
    // Reading never writes, so the index needs no write-time validation.
    config.validate_on_add = false;
    config.file_adapter(None)?.load()
}

fn read_json_object(path: &Path) -> TagResult<BTreeMap<String, String>> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key, s)),
                other => Err(TagError::Normalization(format!(
                    "Value of '{key}' must be string, got {other}"
                ))),
            })
            .collect(),
        _ => Err(TagError::Normalization(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

fn preview(text: &str) -> String {
    let mut shown: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        shown.push_str("...");
    }
    shown
}

fn print_item(item: &IndexedItem) {
    println!("{}  {}", item.id, item.descriptor);
    println!("  {}", preview(&item.text));
}

/// Lint every document under a schema root.
pub fn cmd_lint(root: &Path, json: bool) -> TagResult<()> {
    let issues = lint_schema_root(root)?;
    let errors = issues.iter().filter(|issue| issue.is_error()).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        for issue in &issues {
            println!("{issue}");
        }
        if errors == 0 {
            println!("✓ All schemas passed linting");
        }
    }
    if errors > 0 {
        return Err(TagError::schema(format!("{errors} lint error(s) in {}", root.display())));
    }
    Ok(())
}

/// Validate a descriptor file against a schema version.
pub fn cmd_validate(
    schema_root: &Path,
    version: &str,
    descriptor_path: &Path,
    partial: bool,
    json: bool,
) -> TagResult<()> {
    let catalog = load_schema_root(schema_root)?;
    let descriptor = Descriptor::from_pairs(read_json_object(descriptor_path)?)?;
    let report = descriptor.validate(&catalog, version, partial)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("{report}");
        for warning in &report.warnings {
            println!("  • {warning}");
        }
    }
    report.into_result("Descriptor validation failed")
}

/// Add a text to an index file.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    config: &TagConfig,
    index_path: &Path,
    text: &str,
    fields: &[(String, String)],
    meta: &[(String, String)],
    id: Option<String>,
    allow_duplicates: bool,
    json: bool,
) -> TagResult<()> {
    let descriptor = Descriptor::from_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let metadata: Metadata = meta
        .iter()
        .map(|(key, raw)| (key.clone(), parse_meta_value(raw)))
        .collect();
    let options = AddOptions { id, allow_duplicates };

    let mut manager = open_index(config, index_path)?;
    let item = manager.add(text, descriptor, metadata, options)?;
    if !config.storage.auto_save {
        manager.save()?;
    }

    if json {
        println!("{}", serde_json::json!({"id": item.id, "content_hash": item.content_hash}));
    } else {
        println!("Added {} to {}", item.id, index_path.display());
    }
    Ok(())
}

/// Print one item.
pub fn cmd_get(config: &TagConfig, index_path: &Path, id: &str, json: bool) -> TagResult<()> {
    let index = read_index(config, index_path)?;
    let item = index
        .get(id)
        .ok_or_else(|| TagError::indexing(format!("No item with id {id}")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("ID: {}", item.id);
        println!("Descriptor: {}", item.descriptor);
        if !item.metadata.is_empty() {
            println!("Metadata: {}", serde_json::to_string(&item.metadata)?);
        }
        println!("Created: {}", item.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Updated: {}", item.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Hash: {}", item.content_hash);
        println!();
        println!("{}", item.text);
    }
    Ok(())
}

/// Remove an item from an index file.
pub fn cmd_remove(config: &TagConfig, index_path: &Path, id: &str, json: bool) -> TagResult<()> {
    let mut manager = open_index(config, index_path)?;
    let removed = manager.remove(id)?;
    if removed && !config.storage.auto_save {
        manager.save()?;
    }

    if json {
        println!("{}", serde_json::json!({"id": id, "removed": removed}));
    } else if removed {
        println!("Removed {id}");
    } else {
        println!("No item with id {id}");
    }
    Ok(())
}

/// Run a query over an index file.
pub fn cmd_query(config: &TagConfig, index_path: &Path, options: &QueryOptions, json: bool) -> TagResult<()> {
    let index = read_index(config, index_path)?;
    let mut query = QueryBuilder::on(&index);

    if let Some(domain) = &options.domain {
        query = query.where_domain(&normalize_value(domain, false)?);
    }
    if let Some(intent) = &options.intent {
        query = query.where_intent(&normalize_value(intent, false)?);
    }
    for (field, value) in &options.fields {
        query = query.where_field(field, &normalize_value(value, false)?);
    }
    if let Some(text) = &options.text {
        query = query.where_text_contains(text, false);
    }
    for (key, raw) in &options.meta {
        query = query.where_metadata(key, parse_meta_value(raw));
    }
    match options.sort {
        Some(SortField::Created) => query = query.order_by_created(!options.ascending),
        Some(SortField::Updated) => query = query.order_by_updated(!options.ascending),
        None => {}
    }
    if options.offset > 0 {
        query = query.offset(options.offset);
    }
    if let Some(limit) = options.limit {
        query = query.limit(limit);
    }

    let result = query.execute()?;
    if json {
        let output = serde_json::json!({
            "query": result.query_explanation,
            "total": result.total,
            "items": result.items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", result.query_explanation);
        println!("Found {} matching items (showing {})", result.total, result.items.len());
        for item in result.iter() {
            println!();
            print_item(item);
        }
    }
    Ok(())
}

/// List the distinct values of a field.
pub fn cmd_values(config: &TagConfig, index_path: &Path, field: &str, json: bool) -> TagResult<()> {
    let index = read_index(config, index_path)?;
    let values = index.get_field_values(field);

    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for value in &values {
            println!("{value}");
        }
    }
    Ok(())
}

/// Item count and field value distribution.
pub fn cmd_stats(config: &TagConfig, index_path: &Path, json: bool) -> TagResult<()> {
    let index = read_index(config, index_path)?;
    let items = index.get_all();
    let distribution = field_distribution(&items);

    if json {
        let output = serde_json::json!({
            "file": index_path.display().to_string(),
            "items": items.len(),
            "fields": distribution,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("File: {}", index_path.display());
        println!("Items: {}", items.len());
        for (field, values) in &distribution {
            println!("{field}:");
            for (value, count) in values {
                println!("  {value}: {count}");
            }
        }
    }
    Ok(())
}

/// Rename a descriptor's fields and validate it against the target version.
pub fn cmd_migrate(
    schema_root: &Path,
    descriptor_path: &Path,
    from_version: &str,
    to_version: &str,
    mapping_path: &Path,
) -> TagResult<()> {
    let catalog = load_schema_root(schema_root)?;
    let descriptor = read_json_object(descriptor_path)?;
    let mapping = read_json_object(mapping_path)
        .map_err(|err| TagError::Migration(format!("Invalid migration map: {err}")))?;

    let outcome = migrate_and_validate(&descriptor, &mapping, &catalog, from_version, to_version)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
