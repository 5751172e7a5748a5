//! Configuration file support for stpswitchd.
//!
//! Loads the daemon configuration from TOML.
//! Default location: /etc/sonic/stpswitchd.toml
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [[bridges]]
//! dpid = "0000000000000001"
//! priority = 32768
//! ```

use serde::{Deserialize, Serialize};
use sonic_types::DatapathId;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, StpSwitchError};
use crate::stp::{BridgeConfig, StpConfig};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/stpswitchd.toml";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

/// Event loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLoopConfig {
    /// Capacity of each per-switch mailbox
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth: usize,
}

/// One bridge's static STP settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeEntry {
    pub dpid: DatapathId,

    #[serde(default = "default_bridge_priority")]
    pub priority: u16,

    #[serde(default)]
    pub hello_time: Option<u16>,

    #[serde(default)]
    pub max_age: Option<u16>,

    #[serde(default)]
    pub fwd_delay: Option<u16>,
}

/// Complete stpswitchd configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpSwitchConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub event_loop: EventLoopConfig,

    #[serde(default = "default_bridges")]
    pub bridges: Vec<BridgeEntry>,
}

// Default functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_mailbox_depth() -> usize {
    1024
}

fn default_bridge_priority() -> u16 {
    crate::stp::DEFAULT_BRIDGE_PRIORITY
}

/// Three-bridge lab topology: switch 1 is the preferred root.
fn default_bridges() -> Vec<BridgeEntry> {
    [(1, 0x8000), (2, 0x9000), (3, 0xa000)]
        .into_iter()
        .map(|(dpid, priority)| BridgeEntry {
            dpid: DatapathId::new(dpid),
            priority,
            hello_time: None,
            max_age: None,
            fwd_delay: None,
        })
        .collect()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            mailbox_depth: default_mailbox_depth(),
        }
    }
}

impl Default for StpSwitchConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            event_loop: EventLoopConfig::default(),
            bridges: default_bridges(),
        }
    }
}

impl StpSwitchConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Loads from `path` if given, otherwise from the default location if
    /// it exists, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.event_loop.mailbox_depth == 0 {
            return Err(StpSwitchError::config(
                "event_loop.mailbox_depth",
                "must be greater than 0",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(StpSwitchError::config("logging.level", "cannot be empty"));
        }

        let mut seen = HashSet::new();
        for bridge in &self.bridges {
            if !seen.insert(bridge.dpid) {
                return Err(StpSwitchError::config(
                    "bridges",
                    format!("duplicate dpid {}", bridge.dpid),
                ));
            }
            if bridge.hello_time == Some(0) || bridge.max_age == Some(0) || bridge.fwd_delay == Some(0) {
                return Err(StpSwitchError::config(
                    "bridges",
                    format!("dpid {}: STP timers must be non-zero", bridge.dpid),
                ));
            }
        }

        Ok(())
    }

    /// Builds the configuration pushed to the STP engine.
    pub fn stp_config(&self) -> StpConfig {
        let mut config = StpConfig::new();
        for bridge in &self.bridges {
            config.insert(
                bridge.dpid,
                BridgeConfig {
                    priority: bridge.priority,
                    hello_time: bridge.hello_time,
                    max_age: bridge.max_age,
                    fwd_delay: bridge.fwd_delay,
                },
            );
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StpSwitchConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.event_loop.mailbox_depth, 1024);
        assert_eq!(config.bridges.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_bridge_priorities() {
        let stp = StpSwitchConfig::default().stp_config();
        assert_eq!(stp.get(&DatapathId::new(1)).unwrap().priority, 0x8000);
        assert_eq!(stp.get(&DatapathId::new(2)).unwrap().priority, 0x9000);
        assert_eq!(stp.get(&DatapathId::new(3)).unwrap().priority, 0xa000);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = StpSwitchConfig::from_toml("").unwrap();
        assert_eq!(config, StpSwitchConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config = StpSwitchConfig::from_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [event_loop]
            mailbox_depth = 64

            [[bridges]]
            dpid = "00000000000000aa"
            priority = 4096
            hello_time = 1

            [[bridges]]
            dpid = "00000000000000bb"
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.event_loop.mailbox_depth, 64);
        assert_eq!(config.bridges.len(), 2);
        assert_eq!(config.bridges[0].hello_time, Some(1));
        assert_eq!(config.bridges[1].priority, 0x8000);
    }

    #[test]
    fn test_duplicate_dpid_rejected() {
        let err = StpSwitchConfig::from_toml(
            r#"
            [[bridges]]
            dpid = "0000000000000001"
            [[bridges]]
            dpid = "1"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate dpid 0000000000000001"));
    }

    #[test]
    fn test_zero_mailbox_rejected() {
        let err = StpSwitchConfig::from_toml("[event_loop]\nmailbox_depth = 0\n").unwrap_err();
        assert!(matches!(err, StpSwitchError::Config { .. }));
    }

    #[test]
    fn test_zero_timer_rejected() {
        let result = StpSwitchConfig::from_toml(
            "[[bridges]]\ndpid = \"1\"\nfwd_delay = 0\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_dpid_rejected() {
        let result = StpSwitchConfig::from_toml("[[bridges]]\ndpid = \"not-hex\"\n");
        assert!(matches!(result, Err(StpSwitchError::Toml(_))));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let result = StpSwitchConfig::from_toml("[logging]\nformat = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        let config = StpSwitchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.bridges.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = StpSwitchConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(StpSwitchError::Io(_))));
    }
}
