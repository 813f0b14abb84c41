use crate::model::connection::ConnectionProfile;
use crate::model::source::FileFormat;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `api_url` when set
pub const API_URL_ENV: &str = "CHFILE_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the ingestion service
    pub api_url: String,
    /// Last connection that succeeded; the credential is never written
    #[serde(default)]
    pub connection: ConnectionProfile,
    #[serde(default = "default_export_format")]
    pub export_format: FileFormat,
}

fn default_export_format() -> FileFormat {
    FileFormat::Csv
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            connection: ConnectionProfile::default(),
            export_format: default_export_format(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".chfile-tui"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    pub fn load() -> Option<Config> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }

        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Service URL after applying the environment override
    pub fn resolved_api_url(&self) -> String {
        match env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.api_url.clone(),
        }
    }

    /// Save the config to disk
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            // Create config directory if it doesn't exist
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let mut persisted = self.clone();
        persisted.connection.credential.clear();

        let contents = serde_json::to_string_pretty(&persisted)?;
        fs::write(path, contents)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_never_writes_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.connection.host = "ch.internal".to_string();
        config.connection.credential = "secret".to_string();
        config.save_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secret"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.connection.host, "ch.internal");
        assert!(loaded.connection.credential.is_empty());
        assert_eq!(loaded.export_format, FileFormat::Csv);
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_url": "http://ingest:8000"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_url, "http://ingest:8000");
        assert_eq!(loaded.connection, ConnectionProfile::default());
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.json")).is_none());

        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from(&path).is_none());
    }
}
