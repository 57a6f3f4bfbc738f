use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database file. Defaults to [`default_db_path`].
    pub db_path: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` and `--log-level` are both unset.
    pub log_level: Option<String>,
}

/// Config file path: `~/.config/thoughtlocker/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("thoughtlocker").join("config.toml"))
}

/// Database path used when none is configured.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("thoughtlocker").join("prompts.db"))
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        if let Ok(config) = parse_config(&contents) {
            return config;
        }
        // Logging is configured from this file, so it is not up yet.
        eprintln!(
            "warning: failed to parse config at {}, using defaults",
            path.display()
        );
    }

    AppConfig::default()
}
