//! Interface to the external STP engine.
//!
//! The engine owns port roles, BPDU exchange and timers. This side only
//! pushes static per-bridge configuration once at startup and consumes
//! the topology-change and port-state events the engine raises.

use serde::{Deserialize, Serialize};
use sonic_types::DatapathId;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Default bridge priority from IEEE 802.1D.
pub const DEFAULT_BRIDGE_PRIORITY: u16 = 0x8000;

/// STP port states as reported by the engine.
///
/// The set is closed and owned by the engine; raw codes outside it are
/// kept as-is by [`StpPortState::from_raw`] returning `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StpPortState {
    Disable = 0,
    Block = 1,
    Listen = 2,
    Learn = 3,
    Forward = 4,
}

impl StpPortState {
    /// Maps an engine state code to a known state.
    pub fn from_raw(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Disable),
            1 => Some(Self::Block),
            2 => Some(Self::Listen),
            3 => Some(Self::Learn),
            4 => Some(Self::Forward),
            _ => None,
        }
    }

    /// Operator-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "DISABLE",
            Self::Block => "BLOCK",
            Self::Listen => "LISTEN",
            Self::Learn => "LEARN",
            Self::Forward => "FORWARD",
        }
    }
}

impl fmt::Display for StpPortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static per-bridge STP parameters.
///
/// Timers left unset use the engine's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub priority: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hello_time: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fwd_delay: Option<u16>,
}

impl BridgeConfig {
    pub fn with_priority(priority: u16) -> Self {
        Self {
            priority,
            hello_time: None,
            max_age: None,
            fwd_delay: None,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::with_priority(DEFAULT_BRIDGE_PRIORITY)
    }
}

/// Configuration pushed to the engine: bridge settings per datapath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StpConfig {
    pub bridges: BTreeMap<DatapathId, BridgeConfig>,
}

impl StpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the settings for one bridge.
    pub fn insert(&mut self, dpid: DatapathId, bridge: BridgeConfig) -> Option<BridgeConfig> {
        self.bridges.insert(dpid, bridge)
    }

    pub fn get(&self, dpid: &DatapathId) -> Option<&BridgeConfig> {
        self.bridges.get(dpid)
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

/// Configuration-push side of the STP engine.
pub trait StpEngine: Send + Sync {
    /// Hands the static bridge configuration to the engine.
    ///
    /// Called once at startup, before any event is dispatched.
    fn set_config(&self, config: &StpConfig) -> Result<()>;
}
