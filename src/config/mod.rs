//! Server configuration types.
//!
//! Every field has a serde default so a partial (or absent) config file still
//! yields a complete configuration.

mod defaults;
mod loader;

pub use loader::load;

use serde::{Deserialize, Serialize};

use defaults::{
    default_block_count, default_default_max_clients, default_log_directory,
    default_log_file_name_prefix, default_log_rotation, default_persistent_idle_timeout_secs,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub lobby: LobbyConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level filter; falls back to `RUST_LOG`, then `info`.
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub format: LogFormat,
    /// Also write logs to a rolling file.
    #[serde(default)]
    pub enable_file_logging: bool,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_file_name_prefix")]
    pub file_name_prefix: String,
    /// `daily`, `hourly`, or `never`.
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::default(),
            enable_file_logging: false,
            directory: default_log_directory(),
            file_name_prefix: default_log_file_name_prefix(),
            rotation: default_log_rotation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Number of built-in block lobbies created at startup.
    #[serde(default = "default_block_count")]
    pub block_count: u8,
    /// Slot cap for newly created lobbies.
    #[serde(default = "default_default_max_clients")]
    pub default_max_clients: u8,
    /// How long an empty persistent (non-default) lobby survives, in
    /// seconds. Zero disables the timeout entirely.
    #[serde(default = "default_persistent_idle_timeout_secs")]
    pub persistent_idle_timeout_secs: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            block_count: default_block_count(),
            default_max_clients: default_default_max_clients(),
            persistent_idle_timeout_secs: default_persistent_idle_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: Config = serde_json::from_str("{}").expect("empty object parses");
        assert_eq!(config.lobby.block_count, default_block_count());
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn partial_sections_keep_defaults_for_the_rest() {
        let config: Config = serde_json::from_str(
            r#"{"lobby": {"persistent_idle_timeout_secs": 60}, "logging": {"format": "json"}}"#,
        )
        .expect("partial config parses");
        assert_eq!(config.lobby.persistent_idle_timeout_secs, 60);
        assert_eq!(config.lobby.block_count, default_block_count());
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}
