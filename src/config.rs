//! Configuration management for vtyterm.
//!
//! Settings are read from `~/.vtyterm/config.toml`:
//!
//! ```toml
//! # Prompt prefix
//! hostname = "router"
//!
//! # Printed when a session starts (optional)
//! banner = "Authorized access only"
//!
//! [session]
//! echo = true
//! history_size = 20
//!
//! [listen]
//! address = "127.0.0.1:2601"
//! ```
//!
//! Missing keys take their defaults; a missing or unreadable file means the
//! whole default configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::TerminalSettings;
use crate::error::ConfigError;
use crate::history::HISTORY_LIMIT;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prompt prefix
    pub hostname: String,
    /// Greeting for new sessions
    pub banner: Option<String>,
    /// Session defaults
    pub session: SessionConfig,
    /// Network listener settings
    pub listen: ListenConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "vtyterm".to_string(),
            banner: None,
            session: SessionConfig::default(),
            listen: ListenConfig::default(),
        }
    }
}

/// Defaults applied to every new session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub echo: bool,
    pub history_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            echo: true,
            history_size: HISTORY_LIMIT,
        }
    }
}

/// TCP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub address: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:2601".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::parse(&content)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::get_config_path().ok_or(ConfigError::NoPath)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ConfigError::Write)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(&path, content).map_err(ConfigError::Write)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Engine settings derived from this configuration
    pub fn terminal_settings(&self) -> TerminalSettings {
        TerminalSettings {
            hostname: self.hostname.clone(),
            banner: self.banner.clone(),
            echo: self.session.echo,
            history_size: self.session.history_size,
        }
    }
}

/// `~/.vtyterm`
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(".vtyterm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session.history_size, 20);
        assert!(config.session.echo);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse(
            r#"
hostname = "edge-1"

[session]
echo = false
"#,
        )
        .unwrap();
        assert_eq!(config.hostname, "edge-1");
        assert!(!config.session.echo);
        assert_eq!(config.session.history_size, 20);
        assert_eq!(config.listen.address, "127.0.0.1:2601");

        let settings = config.terminal_settings();
        assert_eq!(settings.hostname, "edge-1");
        assert!(!settings.echo);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::parse("hostname = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config {
            banner: Some("hi".to_string()),
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}
