//! Error types for stpswitchd.
//!
//! Only startup and plumbing failures are represented here. Per-event
//! anomalies (unparseable frames, unknown port states, rejected commands)
//! are recovered locally by the handlers and never abort the daemon.

use sonic_types::DatapathId;
use std::io;
use thiserror::Error;

/// Result type for stpswitchd operations.
pub type Result<T> = std::result::Result<T, StpSwitchError>;

/// Errors that can occur in the controller core and its daemon plumbing.
#[derive(Debug, Error)]
pub enum StpSwitchError {
    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// IO error (config file, stdin/stdout).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file is not valid TOML.
    #[error("Failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Event or command record is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command could not be handed to the switch-control layer.
    #[error("Command delivery to dpid={dpid} failed: {message}")]
    CommandDelivery {
        /// Target switch.
        dpid: DatapathId,
        /// Error message.
        message: String,
    },

    /// The STP engine rejected the configuration push.
    #[error("STP engine error: {0}")]
    StpEngine(String),

    /// Internal error (unexpected state).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StpSwitchError {
    /// Creates an invalid configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a command delivery error.
    pub fn command_delivery(dpid: DatapathId, message: impl Into<String>) -> Self {
        Self::CommandDelivery {
            dpid,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error indicates a transient condition.
    ///
    /// Nothing in the core retries; the flag is surfaced in logs so an
    /// operator can tell a dead switch channel from a bad config.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CommandDelivery { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_error_display() {
        let err = StpSwitchError::config("bridges", "duplicate dpid 0000000000000001");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for bridges: duplicate dpid 0000000000000001"
        );
    }

    #[test]
    fn test_command_delivery_display() {
        let err = StpSwitchError::command_delivery(DatapathId::new(1), "channel closed");
        assert_eq!(
            err.to_string(),
            "Command delivery to dpid=0000000000000001 failed: channel closed"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(StpSwitchError::command_delivery(DatapathId::new(1), "closed").is_retryable());
        assert!(!StpSwitchError::config("x", "y").is_retryable());
        assert!(!StpSwitchError::internal("bug").is_retryable());
    }
}
