use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "doxysearch";
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding [`Config::database_path`].
pub const DB_ENV: &str = "DOXYSEARCH_DB";
/// Environment variable overriding [`Config::port`].
pub const PORT_ENV: &str = "DOXYSEARCH_PORT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding imported docsets. Platform data dir when unset.
    pub database_path: Option<PathBuf>,
    /// Port the HTTP API listens on.
    pub port: u16,
    /// Maximum number of results returned by a search.
    pub search_limit: usize,
    /// Whether `check` resolves anchors against the HTML pages by default.
    pub check_anchors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            port: 17020,
            search_limit: 20,
            check_anchors: true,
        }
    }
}

impl Config {
    /// Load configuration from the user's config directory, then apply
    /// environment overrides.
    /// Returns default config if file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_env()
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Apply `DOXYSEARCH_DB` and `DOXYSEARCH_PORT`.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(DB_ENV).ok(),
            std::env::var(PORT_ENV).ok(),
        )
    }

    fn with_overrides(mut self, db: Option<String>, port: Option<String>) -> Self {
        if let Some(db) = db.filter(|s| !s.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(db));
        }
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", PORT_ENV, port),
            }
        }
        self
    }

    /// Save the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Database path, falling back to the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::default_path(),
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "search_limit": 5 }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.port, Config::default().port);
        assert!(config.check_anchors);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_overrides(Some("/tmp/docs.db".to_string()), Some("8080".to_string()));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/docs.db")));
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/docs.db"));
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let config = Config::default().with_overrides(Some("  ".to_string()), Some("http".to_string()));
        assert_eq!(config, Config::default());
    }
}
