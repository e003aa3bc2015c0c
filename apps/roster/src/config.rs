//! # Configuration
//!
//! Runtime settings for the server and CLI.
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. `roster.toml` in the working directory, or the file named by `--config`
//! 3. `ROSTER_*` environment variables
//! 4. Command-line flags (applied by the CLI)
//!
//! A missing `roster.toml` is ignored; a missing file named explicitly is an
//! error.

use roster_core::primitives::STATS_CACHE_TTL;
use roster_core::{JsonFileBackend, Manager, RedbBackend, RosterError, StorageBackend};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    /// Store location (JSON file or redb database).
    pub data_path: PathBuf,
    /// Storage backend: "json", "redb" or "memory".
    pub backend: String,
    /// Statistics cache lifetime in seconds.
    pub stats_ttl_secs: u64,
    pub host: String,
    pub port: u16,
    /// Log output: "text" or "json".
    pub log_format: String,
    /// Comma-separated CORS origins, or "*". Unset means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("students.json"),
            backend: "json".to_string(),
            stats_ttl_secs: STATS_CACHE_TTL.as_secs(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_format: "text".to_string(),
            cors_origins: None,
        }
    }
}

impl RosterConfig {
    /// Defaults overlaid with the config file and then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, RosterError> {
        let mut config = match path {
            Some(explicit) => Self::from_file(explicit)?,
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file. Absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RosterError::Persistence(format!(
                "Cannot read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, RosterError> {
        toml::from_str(text).map_err(|e| RosterError::Parse(format!("Invalid config: {}", e)))
    }

    /// Overlay `ROSTER_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Overlay variables resolved through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("ROSTER_DATA") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(backend) = lookup("ROSTER_BACKEND") {
            self.backend = backend;
        }
        if let Some(raw) = lookup("ROSTER_STATS_TTL") {
            match raw.trim().parse() {
                Ok(secs) => self.stats_ttl_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid ROSTER_STATS_TTL '{}'", raw),
            }
        }
        if let Some(host) = lookup("ROSTER_HOST") {
            self.host = host;
        }
        if let Some(raw) = lookup("ROSTER_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid ROSTER_PORT '{}'", raw),
            }
        }
        if let Some(format) = lookup("ROSTER_LOG_FORMAT") {
            self.log_format = format;
        }
        if let Some(origins) = lookup("ROSTER_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
    }

    #[must_use]
    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }

    /// `host:port` for the HTTP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open the configured backend and load the registry from it.
    pub fn open_manager(&self) -> Result<Manager, RosterError> {
        let backend: Box<dyn StorageBackend> = match self.backend.as_str() {
            "json" => Box::new(JsonFileBackend::open(&self.data_path)),
            "redb" => Box::new(RedbBackend::open(&self.data_path)?),
            "memory" => return Ok(Manager::in_memory().with_stats_ttl(self.stats_ttl())),
            other => {
                return Err(RosterError::Parse(format!(
                    "Unknown backend '{}' (expected json, redb or memory)",
                    other
                )));
            }
        };
        Ok(Manager::open(backend)?.with_stats_ttl(self.stats_ttl()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = RosterConfig::from_toml(
            r#"
            backend = "redb"
            port = 9090
            "#,
        )
        .expect("parse");
        assert_eq!(config.backend, "redb");
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.stats_ttl_secs, 30);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            RosterConfig::from_toml("colour = \"blue\""),
            Err(RosterError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = RosterConfig::from_toml("port = 9090\nlog_format = \"text\"").expect("parse");
        let vars: HashMap<&str, &str> = [
            ("ROSTER_PORT", "7070"),
            ("ROSTER_LOG_FORMAT", "json"),
            ("ROSTER_STATS_TTL", "not-a-number"),
            ("ROSTER_CORS_ORIGINS", "*"),
        ]
        .into_iter()
        .collect();
        config.apply_vars(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.port, 7070);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.stats_ttl_secs, 30);
        assert_eq!(config.cors_origins.as_deref(), Some("*"));
        assert_eq!(config.bind_addr(), "127.0.0.1:7070");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = temp.path().join("absent.toml");
        assert!(matches!(
            RosterConfig::load(Some(&missing)),
            Err(RosterError::Persistence(_))
        ));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let config = RosterConfig {
            backend: "sqlite".to_string(),
            ..RosterConfig::default()
        };
        assert!(matches!(config.open_manager(), Err(RosterError::Parse(_))));
    }

    #[test]
    fn redb_backend_opens_under_data_path() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = RosterConfig {
            backend: "redb".to_string(),
            data_path: temp.path().join("roster.redb"),
            ..RosterConfig::default()
        };
        let manager = config.open_manager().expect("open");
        assert!(manager.is_empty());
        assert!(manager.backend_name().starts_with("redb:"));
    }
}
