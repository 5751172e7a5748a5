//! OpenFlow port numbers.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An OpenFlow 1.3 port number.
///
/// Physical and logical ports are numbered from 1. The values this
/// controller emits above that range are reserved ports with special
/// forwarding meaning (flood, controller, wildcard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortNo(u32);

impl PortNo {
    /// Flood to all ports except the input port and blocked ports.
    pub const FLOOD: PortNo = PortNo(0xffff_fffb);
    /// Send to the controller.
    pub const CONTROLLER: PortNo = PortNo(0xffff_fffd);
    /// Wildcard port used in flow deletes.
    pub const ANY: PortNo = PortNo(0xffff_ffff);

    /// Creates a port number from its raw value.
    pub const fn new(port: u32) -> Self {
        PortNo(port)
    }
}

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PortNo::FLOOD => write!(f, "FLOOD"),
            PortNo::CONTROLLER => write!(f, "CONTROLLER"),
            PortNo::ANY => write!(f, "ANY"),
            PortNo(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for PortNo {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FLOOD" => Ok(PortNo::FLOOD),
            "CONTROLLER" => Ok(PortNo::CONTROLLER),
            "ANY" => Ok(PortNo::ANY),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse::<u32>()
                .map(PortNo)
                .map_err(|_| ParseError::InvalidPortNo(s.to_string())),
            _ => Err(ParseError::InvalidPortNo(s.to_string())),
        }
    }
}
