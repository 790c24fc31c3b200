//! Reading schema documents from a directory tree.
//!
//! Layout: `<root>/registry.json` plus one directory per version holding a
//! `<field>.json` document per field.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::schema::{
    lint_field_document, lint_registry, parse_field_document, FieldDocument, LintIssue, LintSeverity, RegistryDocument,
    SchemaCatalog,
};
use crate::types::{TagError, TagResult};

pub const REGISTRY_FILE: &str = "registry.json";

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read and parse one field document, checking its declared version.
pub fn read_field_document(path: &Path, version: &str) -> TagResult<FieldDocument> {
    let label = file_label(path);
    let raw = std::fs::read_to_string(path)?;
    let doc = parse_field_document(&raw).map_err(|err| err.in_file(label.clone()))?;
    if let Some(declared) = &doc.version {
        if declared != version {
            return Err(TagError::SchemaVersion {
                expected: version.to_string(),
                actual: declared.clone(),
                source_file: Some(label),
            });
        }
    }
    Ok(doc)
}

/// `*.json` files of a directory (except the registry), sorted by name.
fn json_files(dir: &Path) -> TagResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("json")
                && path.file_name().and_then(|n| n.to_str()) != Some(REGISTRY_FILE)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Every field document in a version directory, keyed by file stem.
pub fn read_version_dir(dir: &Path, version: &str) -> TagResult<Vec<(String, FieldDocument)>> {
    if !dir.is_dir() {
        return Err(TagError::schema(format!("Schema directory not found: {}", dir.display())));
    }
    let files = json_files(dir)?;
    if files.is_empty() {
        return Err(TagError::schema(format!("No schema files found in {}", dir.display())));
    }
    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let field = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        documents.push((field, read_field_document(&path, version)?));
    }
    Ok(documents)
}

/// Catalog holding just the one version found in `dir`.
pub fn load_version_dir(dir: &Path, version: &str) -> TagResult<SchemaCatalog> {
    let mut builder = SchemaCatalog::builder();
    for (field, doc) in read_version_dir(dir, version)? {
        builder = builder.field(version, field, doc);
    }
    builder.build()
}

pub fn read_registry(root: &Path) -> TagResult<Option<RegistryDocument>> {
    let path = root.join(REGISTRY_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    RegistryDocument::from_json_str(&raw)
        .map(Some)
        .map_err(|err| err.in_file(REGISTRY_FILE))
}

fn version_dirs(root: &Path) -> TagResult<Vec<String>> {
    let mut versions: Vec<String> = std::fs::read_dir(root)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.') && !name.starts_with("__"))
        .collect();
    versions.sort();
    Ok(versions)
}

/// Load every version under a schema root.
///
/// With a registry, exactly the registered documents are read and checked
/// against it; without one, every version directory is loaded in full.
pub fn load_schema_root(root: &Path) -> TagResult<SchemaCatalog> {
    if !root.is_dir() {
        return Err(TagError::schema(format!("Schema directory not found: {}", root.display())));
    }

    let mut builder = SchemaCatalog::builder();
    match read_registry(root)? {
        Some(registry) => {
            for (version, fields) in &registry.versions {
                for field in fields {
                    let path = root.join(version).join(registry.document_name(field));
                    let doc = read_field_document(&path, version)?;
                    builder = builder.field(version.clone(), field.clone(), doc);
                }
            }
            builder = builder.registry(registry);
        }
        None => {
            for version in version_dirs(root)? {
                for (field, doc) in read_version_dir(&root.join(&version), &version)? {
                    builder = builder.field(version.clone(), field, doc);
                }
            }
        }
    }
    let catalog = builder.build()?;
    log::info!("loaded schema root {}", root.display());
    Ok(catalog)
}

/// Lint a whole schema root: the registry plus every field document.
pub fn lint_schema_root(root: &Path) -> TagResult<Vec<LintIssue>> {
    let mut issues = Vec::new();
    let mut available: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for version in version_dirs(root)? {
        let dir = root.join(&version);
        let files = json_files(&dir)?;
        for path in &files {
            let field = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let location = format!("{version}/{}", file_label(path));
            let raw = std::fs::read_to_string(path)?;
            match parse_field_document(&raw) {
                Ok(doc) => issues.extend(lint_field_document(&field, &doc, &version).into_iter().map(
                    |mut issue| {
                        issue.location = location.clone();
                        issue
                    },
                )),
                Err(err) => issues.push(LintIssue {
                    severity: LintSeverity::Error,
                    location,
                    message: err.to_string(),
                }),
            }
        }
        available.insert(version, files.iter().map(|path| file_label(path)).collect());
    }

    match read_registry(root)? {
        Some(registry) => issues.extend(lint_registry(&registry, &available)),
        None => issues.push(LintIssue {
            severity: LintSeverity::Error,
            location: root.display().to_string(),
            message: "Missing registry.json".to_string(),
        }),
    }
    Ok(issues)
}
