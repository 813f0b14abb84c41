//! Data source selection: remote table or local flat file

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which origin supplies the data for the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    RemoteTable,
    FlatFile,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::RemoteTable => "ClickHouse table",
            SourceKind::FlatFile => "Flat file",
        }
    }
}

/// A column as reported by the store or sniffed from a file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Supported flat file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Detect the format from a file name's extension
    pub fn from_file_name(name: &str) -> Option<FileFormat> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    /// Value sent to the service as `file_format`
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }

    pub fn toggle(&self) -> FileFormat {
        match self {
            FileFormat::Csv => FileFormat::Json,
            FileFormat::Json => FileFormat::Csv,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Json => "application/json",
        }
    }
}

/// A user-chosen local file, fully loaded in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFile {
    pub path: PathBuf,
    pub name: String,
    pub format: FileFormat,
    pub bytes: Vec<u8>,
    /// Columns found in the header row (CSV) or first record (JSON)
    pub columns: Vec<ColumnInfo>,
}

/// The active source branch with its branch-specific payload
///
/// Exactly one branch is live at a time, so a table selection and a file
/// handle can never coexist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Source {
    #[default]
    Unselected,
    RemoteTable {
        /// Table names from the last successful listing
        tables: Vec<String>,
        selected: Option<String>,
    },
    FlatFile {
        file: Option<FlatFile>,
    },
}

impl Source {
    /// Fresh, empty branch for a kind
    pub fn empty(kind: SourceKind) -> Source {
        match kind {
            SourceKind::RemoteTable => Source::RemoteTable {
                tables: Vec::new(),
                selected: None,
            },
            SourceKind::FlatFile => Source::FlatFile { file: None },
        }
    }

    pub fn kind(&self) -> Option<SourceKind> {
        match self {
            Source::Unselected => None,
            Source::RemoteTable { .. } => Some(SourceKind::RemoteTable),
            Source::FlatFile { .. } => Some(SourceKind::FlatFile),
        }
    }

    /// Table catalog; empty unless the remote branch is active
    pub fn tables(&self) -> &[String] {
        match self {
            Source::RemoteTable { tables, .. } => tables,
            _ => &[],
        }
    }

    pub fn selected_table(&self) -> Option<&str> {
        match self {
            Source::RemoteTable { selected, .. } => selected.as_deref(),
            _ => None,
        }
    }

    pub fn file(&self) -> Option<&FlatFile> {
        match self {
            Source::FlatFile { file } => file.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_from_name() {
        assert_eq!(FileFormat::from_file_name("data.csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_file_name("DATA.JSON"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_file_name("archive.tar.gz"), None);
        assert_eq!(FileFormat::from_file_name("noext"), None);
    }

    #[test]
    fn test_source_accessors_follow_branch() {
        let remote = Source::RemoteTable {
            tables: vec!["events".to_string()],
            selected: Some("events".to_string()),
        };
        assert_eq!(remote.kind(), Some(SourceKind::RemoteTable));
        assert_eq!(remote.tables(), ["events".to_string()]);
        assert_eq!(remote.selected_table(), Some("events"));
        assert!(remote.file().is_none());

        let file = Source::empty(SourceKind::FlatFile);
        assert_eq!(file.kind(), Some(SourceKind::FlatFile));
        assert!(file.tables().is_empty());
        assert!(file.selected_table().is_none());

        assert_eq!(Source::default().kind(), None);
    }

    #[test]
    fn test_column_info_deserializes_type_field() {
        let column: ColumnInfo =
            serde_json::from_str(r#"{"name": "id", "type": "UInt64"}"#).unwrap();
        assert_eq!(column, ColumnInfo::new("id", "UInt64"));
    }
}
