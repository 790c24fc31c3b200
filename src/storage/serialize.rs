//! JSON and NDJSON encodings of indexed items.
//!
//! Serialization performs no validation; that is decided when a loaded item
//! list is turned back into an index.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{IndexedItem, TagError, TagResult};

/// On-disk encoding of an item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// One pretty-printed JSON array.
    #[default]
    Json,
    /// One compact JSON object per line.
    Ndjson,
}

impl StorageFormat {
    /// Guess from the file extension; anything unrecognized is JSON.
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("ndjson") | Some("jsonl") => Self::Ndjson,
            _ => Self::Json,
        }
    }

    /// File extension used for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }
}

impl std::str::FromStr for StorageFormat {
    type Err = TagError;

    fn from_str(s: &str) -> TagResult<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            other => Err(TagError::Config(format!("Unsupported storage format: {other}"))),
        }
    }
}

pub fn to_json(items: &[IndexedItem]) -> TagResult<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

pub fn from_json(data: &str) -> TagResult<Vec<IndexedItem>> {
    Ok(serde_json::from_str(data)?)
}

pub fn to_ndjson(items: &[IndexedItem]) -> TagResult<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse NDJSON; blank lines are skipped.
pub fn from_ndjson(data: &str) -> TagResult<Vec<IndexedItem>> {
    data.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(TagError::from))
        .collect()
}

/// Encode items to any writer.
pub fn write_to(items: &[IndexedItem], format: StorageFormat, writer: &mut impl Write) -> TagResult<()> {
    match format {
        StorageFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, items)?;
            writer.write_all(b"\n")?;
        }
        StorageFormat::Ndjson => {
            for item in items {
                serde_json::to_writer(&mut *writer, item)?;
                writer.write_all(b"\n")?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Decode items from any reader.
pub fn read_from(format: StorageFormat, reader: impl Read) -> TagResult<Vec<IndexedItem>> {
    match format {
        StorageFormat::Json => Ok(serde_json::from_reader(BufReader::new(reader))?),
        StorageFormat::Ndjson => {
            let mut items = Vec::new();
            for line in BufReader::new(reader).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                items.push(serde_json::from_str(&line)?);
            }
            Ok(items)
        }
    }
}

/// Write items to a file, creating parent directories as needed.
pub fn write_to_file(items: &[IndexedItem], format: StorageFormat, path: &Path) -> TagResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_to(items, format, &mut writer)
}

pub fn read_from_file(format: StorageFormat, path: &Path) -> TagResult<Vec<IndexedItem>> {
    let file = std::fs::File::open(path)?;
    read_from(format, file)
}

/// Append one item as an NDJSON line.
pub fn append_ndjson(item: &IndexedItem, path: &Path) -> TagResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, item)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
