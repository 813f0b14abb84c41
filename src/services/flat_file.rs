//! Local flat file loading and column sniffing

use crate::model::source::{ColumnInfo, FileFormat, FlatFile};
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Columns created by the service for imported files are all strings
const IMPORTED_COLUMN_TYPE: &str = "String";

/// Expand a leading `~/` to the home directory
pub fn expand_path(input: &str) -> PathBuf {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(input)
}

/// Read a `.csv` or `.json` file and discover its columns
pub fn load(path: &Path) -> Result<FlatFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let Some(format) = FileFormat::from_file_name(&name) else {
        bail!("Unsupported file format: {} (expected .csv or .json)", name);
    };

    if !path.is_file() {
        bail!("File not found: {}", path.display());
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let columns = sniff_columns(format, &bytes)
        .with_context(|| format!("Failed to read columns from {}", name))?;

    Ok(FlatFile {
        path: path.to_path_buf(),
        name,
        format,
        bytes,
        columns,
    })
}

/// Column names from a CSV header row or the first JSON record
pub fn sniff_columns(format: FileFormat, bytes: &[u8]) -> Result<Vec<ColumnInfo>> {
    let names = match format {
        FileFormat::Csv => csv_header(bytes)?,
        FileFormat::Json => json_keys(bytes)?,
    };

    if names.is_empty() {
        bail!("No columns found");
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            bail!("Duplicate column: {}", name);
        }
    }

    Ok(names
        .into_iter()
        .map(|name| ColumnInfo::new(name, IMPORTED_COLUMN_TYPE))
        .collect())
}

fn csv_header(bytes: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let headers = reader.headers().context("Invalid CSV header")?;
    let mut names = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let name = header.trim();
        if name.is_empty() {
            bail!("Blank header in column {}", i + 1);
        }
        names.push(name.to_string());
    }
    Ok(names)
}

/// Accepts an array of records or a column-oriented object
fn json_keys(bytes: &[u8]) -> Result<Vec<String>> {
    let value: Value = serde_json::from_slice(bytes).context("Invalid JSON")?;
    let object = match &value {
        Value::Array(records) => match records.first() {
            Some(Value::Object(record)) => record,
            Some(_) => bail!("Expected an array of objects"),
            None => bail!("JSON array is empty"),
        },
        Value::Object(columns) => columns,
        _ => bail!("Expected an array of objects"),
    };
    Ok(object.keys().cloned().collect())
}
