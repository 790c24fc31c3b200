//! Moving descriptors between schema versions by renaming fields.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::normalize::normalize_descriptor;
use crate::schema::SchemaCatalog;
use crate::types::{TagError, TagResult};

/// A descriptor migrated to a new schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub from_version: String,
    pub to_version: String,
    pub descriptor: BTreeMap<String, String>,
}

/// Rename fields according to `mapping`; unmapped fields keep their name.
///
/// Two fields landing on the same name is a [`TagError::Migration`].
pub fn migrate_descriptor(
    descriptor: &BTreeMap<String, String>,
    mapping: &BTreeMap<String, String>,
) -> TagResult<BTreeMap<String, String>> {
    let mut migrated = BTreeMap::new();
    for (field, value) in descriptor {
        let target = mapping.get(field).unwrap_or(field);
        if migrated.insert(target.clone(), value.clone()).is_some() {
            return Err(TagError::Migration(format!(
                "Field collision after migration: '{target}'"
            )));
        }
    }
    Ok(migrated)
}

/// Rename, normalize, and validate completely against `to_version`.
pub fn migrate_and_validate(
    descriptor: &BTreeMap<String, String>,
    mapping: &BTreeMap<String, String>,
    catalog: &SchemaCatalog,
    from_version: &str,
    to_version: &str,
) -> TagResult<MigrationOutcome> {
    let migrated = normalize_descriptor(migrate_descriptor(descriptor, mapping)?, true)?;
    catalog
        .validate_complete(to_version, &migrated)?
        .into_result("Migration produced invalid descriptor")?;
    log::info!("migrated descriptor from {from_version} to {to_version}");
    Ok(MigrationOutcome {
        from_version: from_version.to_string(),
        to_version: to_version.to_string(),
        descriptor: migrated,
    })
}
