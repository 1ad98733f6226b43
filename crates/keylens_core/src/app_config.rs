use crate::{Encoding, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5540/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_scan_count")]
    pub scan_count_default: u32,

    #[serde(default = "default_cli_history_limit")]
    pub cli_history_limit: usize,

    #[serde(default)]
    pub encoding: Encoding,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_scan_count() -> u32 {
    500
}

fn default_cli_history_limit() -> usize {
    20
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            scan_count_default: default_scan_count(),
            cli_history_limit: default_cli_history_limit(),
            encoding: Encoding::default(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

pub struct AppConfigStore {
    path: PathBuf,
}

impl AppConfigStore {
    pub fn new() -> Result<Self, StorageError> {
        let config_dir = dirs::config_dir().ok_or(StorageError::MissingDirectory("config"))?;

        let app_dir = config_dir.join("keylens");
        fs::create_dir_all(&app_dir)?;

        Ok(Self {
            path: app_dir.join("config.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<AppConfig, StorageError> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = AppConfigStore::at(dir.path().join("config.json"));

        let config = store.load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "api_base_url": "http://10.0.0.5:5540/api", "encoding": "utf8" }"#)
            .unwrap();

        let config = AppConfigStore::at(&path).load().unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.5:5540/api");
        assert_eq!(config.encoding, Encoding::Utf8);
        assert_eq!(config.cli_history_limit, 20);
        assert_eq!(config.scan_count_default, 500);
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfigStore::at(&path).load(),
            Err(StorageError::Serialization(_))
        ));
    }
}
