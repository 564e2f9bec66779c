//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Service configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// HTTP listener and logging.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in startup logs and `/health`.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Address for the JSON API, `/metrics` and `/health`.
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            http_addr: default_http_addr(),
            log_json: false,
        }
    }
}

/// Credential store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Upper bound on any single storage call.
    #[serde(default = "default_storage_timeout_secs")]
    pub storage_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            storage_timeout_secs: default_storage_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}

/// Session token lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sliding time-to-live; every validation pushes expiry this far out.
    #[serde(default = "default_session_ttl_minutes")]
    pub ttl_minutes: u64,
    /// How often expired rows are deleted.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl_minutes(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

/// In-flight dialogue housekeeping.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Dialogues untouched for this long are discarded.
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout_minutes(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl DialogueConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_minutes.saturating_mul(60))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.session.ttl(), Duration::from_secs(30 * 60));
        assert_eq!(config.dialogue.idle_timeout(), Duration::from_secs(15 * 60));
        assert_eq!(config.database.path, "bookbot.db");
        assert_eq!(config.server.http_addr.port(), 8080);
        assert!(!config.server.log_json);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[session]
ttl_minutes = 5

[database]
path = ":memory:"
"#,
        )
        .unwrap();
        assert_eq!(config.session.ttl_minutes, 5);
        assert_eq!(config.session.purge_interval_secs, 300);
        assert_eq!(config.database.storage_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhttp_addr = \"0.0.0.0:9000\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.http_addr.port(), 9000);
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nttl_minutes = \"soon\"").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
