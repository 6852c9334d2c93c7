//! Configuration for the store client and the provisioning pipeline

use crate::error::ConfigError;
use crate::identifier::MAX_FILE_BYTES;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Content store client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL for the content store HTTP API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Application ID for namespacing
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Optional bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8090".to_string()
}

fn default_app_id() -> String {
    "lamad".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: default_app_id(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Provisioning pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wait after unit creation before materials reference it (ms)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Upload size limit in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Fail validation when no material slot is filled
    #[serde(default = "default_true")]
    pub require_materials: bool,
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_max_file_bytes() -> u64 {
    MAX_FILE_BYTES
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            max_file_bytes: default_max_file_bytes(),
            require_materials: true,
        }
    }
}

impl PipelineConfig {
    /// No settle delay, for tests and stores with read-after-write consistency
    pub fn immediate() -> Self {
        Self {
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Combined configuration file
///
/// ```toml
/// [storage]
/// base_url = "https://store.example.com"
/// app_id = "lamad"
///
/// [pipeline]
/// settle_delay_ms = 250
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lamad.toml");
        std::fs::write(
            &path,
            "[storage]\nbase_url = \"https://store.example.com\"\n\n[pipeline]\nsettle_delay_ms = 250\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.base_url, "https://store.example.com");
        assert_eq!(config.storage.app_id, "lamad");
        assert_eq!(config.storage.timeout_secs, 30);
        assert_eq!(config.pipeline.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.pipeline.max_file_bytes, 5 * 1024 * 1024);
        assert!(config.pipeline.require_materials);
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lamad.toml");

        let mut config = Config::default();
        config.storage.api_key = Some("secret".into());
        config.pipeline.require_materials = false;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/lamad.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
