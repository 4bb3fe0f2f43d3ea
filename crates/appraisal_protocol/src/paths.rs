use std::path::PathBuf;

/// Resolve the Appraisal home directory.
///
/// Priority:
/// 1) APPRAISAL_HOME
/// 2) the user's home directory
/// 3) ./.appraisal
pub fn appraisal_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("APPRAISAL_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".appraisal"))
        .unwrap_or_else(|| PathBuf::from(".").join(".appraisal"))
}

/// Default store path: ~/.appraisal/housing.sqlite3
pub fn default_db_path() -> PathBuf {
    appraisal_home().join("housing.sqlite3")
}

/// Default logs directory: ~/.appraisal/logs
pub fn default_logs_dir() -> PathBuf {
    appraisal_home().join("logs")
}

/// Default config file: ~/.appraisal/appraisal.toml
pub fn default_config_path() -> PathBuf {
    appraisal_home().join("appraisal.toml")
}
