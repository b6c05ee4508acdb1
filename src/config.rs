//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{BackendConfig, FileSessionStore, MemorySessionStore, SessionStore};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_url")]
    pub url: String,

    /// Public (anon) API key sent with every request
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            anon_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where the signed-in session is kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub store: SessionStoreKind,

    /// Session file; defaults to the platform data directory
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Candidate config files, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("sunflow").join("config.toml")),
            Some(PathBuf::from("/etc/sunflow/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `SUNFLOW_*` overrides from any variable source
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SUNFLOW_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = var("SUNFLOW_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(path) = var("SUNFLOW_SESSION_PATH") {
            self.session.path = Some(path);
        }
        if let Some(level) = var("SUNFLOW_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("SUNFLOW_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Connection settings for the REST client
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            url: self.backend.url.trim_end_matches('/').to_string(),
            anon_key: self.backend.anon_key.clone(),
            request_timeout_ms: self.backend.request_timeout_secs.saturating_mul(1000),
        }
    }

    /// Session store selected by `[session]`
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self.session.store {
            SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
            SessionStoreKind::File => {
                let path = self
                    .session
                    .path
                    .as_ref()
                    .map(PathBuf::from)
                    .unwrap_or_else(FileSessionStore::default_path);
                Arc::new(FileSessionStore::new(path))
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# SunFlow Inventory Configuration
#
# Environment variables override these settings:
# - SUNFLOW_BACKEND_URL
# - SUNFLOW_ANON_KEY
# - SUNFLOW_SESSION_PATH
# - SUNFLOW_LOG_LEVEL
# - SUNFLOW_LOG_FORMAT

[backend]
# Project URL of the hosted backend
url = "http://localhost:54321"

# Public anon key of the project
anon_key = ""

# Request timeout in seconds
request_timeout_secs = 10

[session]
# Where to keep the signed-in session: file or memory
store = "file"

# Session file (defaults to the platform data directory)
# path = "~/.local/share/sunflow/session.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty or json
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.backend.url, "http://localhost:54321");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.session.store, SessionStoreKind::File);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nurl = \"https://abc.example.co/\"\nanon_key = \"public-key\"\n\n[session]\nstore = \"memory\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.backend.anon_key, "public-key");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.session.store, SessionStoreKind::Memory);
        assert_eq!(config.logging.level, "warn");

        let backend = config.backend_config();
        assert_eq!(backend.url, "https://abc.example.co");
        assert_eq!(backend.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_load_errors() {
        let missing = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nurl = 3").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SUNFLOW_BACKEND_URL", "https://env.example.co"),
            ("SUNFLOW_ANON_KEY", "env-key"),
            ("SUNFLOW_SESSION_PATH", "/tmp/sunflow-session.json"),
            ("SUNFLOW_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.backend.url, "https://env.example.co");
        assert_eq!(config.backend.anon_key, "env-key");
        assert_eq!(config.session.path.as_deref(), Some("/tmp/sunflow-session.json"));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_memory_session_store() {
        let config = Config {
            session: SessionSettings {
                store: SessionStoreKind::Memory,
                path: None,
            },
            ..Default::default()
        };
        let store = config.session_store();
        assert!(store.load().unwrap().is_none());
    }
}
