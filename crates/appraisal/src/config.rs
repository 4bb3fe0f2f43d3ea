//! Configuration for the Appraisal pipeline
//!
//! Loaded from `~/.appraisal/appraisal.toml` unless a path is given. Every
//! field has a default, so a missing file or a partial file both work.

use crate::error::{PipelineError, Result};
use appraisal_protocol::paths::{default_config_path, default_db_path, default_logs_dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the pipeline and its HTTP adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// CSV file read by `appraisal run`
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Linear model document
    #[serde(default = "default_model_file")]
    pub model_file: PathBuf,

    /// SQLite database holding the lineage tables
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory for the rolling log file
    #[serde(default = "default_log_dir")]
    pub log_dir: Option<PathBuf>,

    /// Fields every input record must carry (matched case-insensitively)
    #[serde(default = "default_required_columns")]
    pub required_columns: Vec<String>,

    /// Persisted with the transformed rows but never handed to the model
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Fixed category vocabularies, column -> categories
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// How long a write waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_input_file() -> PathBuf {
    PathBuf::from("housing.csv")
}

fn default_model_file() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_log_dir() -> Option<PathBuf> {
    Some(default_logs_dir())
}

pub fn default_required_columns() -> Vec<String> {
    [
        "LONGITUDE",
        "LATITUDE",
        "MEDIAN_AGE",
        "ROOMS",
        "BEDROOMS",
        "POP",
        "HOUSEHOLDS",
        "MEDIAN_INCOME",
        "MEDIAN_HOUSE_VALUE",
        "OCEAN_PROXIMITY",
        "AGENCY",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_target_column() -> String {
    "median_house_value".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            model_file: default_model_file(),
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            required_columns: default_required_columns(),
            target_column: default_target_column(),
            categories: BTreeMap::new(),
            server: ServerConfig::default(),
            store: StoreSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| PipelineError::config(e.to_string()))?;
        Ok(config)
    }

    /// Load `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PipelineError::config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.store.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.required_columns.len(), 11);
        assert_eq!(config.target_column, "median_house_value");
        assert!(config.categories.is_empty());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(
            config.db_path.ends_with("housing.sqlite3"),
            "unexpected db path: {}",
            config.db_path.display()
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            db_path = "/tmp/h.sqlite3"

            [categories]
            ocean_proximity = ["INLAND", "NEAR BAY"]
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/h.sqlite3"));
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert_eq!(config.categories["ocean_proximity"].len(), 2);
        assert_eq!(config.required_columns, default_required_columns());
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("conf").join("appraisal.toml");

        let mut config = AppConfig::default();
        config.input_file = PathBuf::from("batch.csv");
        config.store.busy_timeout_ms = 250;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.input_file, PathBuf::from("batch.csv"));
        assert_eq!(loaded.store.busy_timeout_ms, 250);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(Some(&tmp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.model_file, PathBuf::from("model.json"));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "required_columns = 3").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(PipelineError::Config(_))));
    }
}
