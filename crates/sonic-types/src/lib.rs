//! Common SONiC types for OpenFlow switch control.
//!
//! This crate provides type-safe representations of the network primitives
//! shared by the L2 control plane daemons:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses
//! - [`DatapathId`]: 64-bit OpenFlow switch (datapath) identifiers
//! - [`PortNo`]: OpenFlow port numbers, including the reserved ports

mod datapath;
mod mac;
mod port;

pub use datapath::DatapathId;
pub use mac::MacAddress;
pub use port::PortNo;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid datapath ID: {0} (expected up to 16 hex digits)")]
    InvalidDatapathId(String),

    #[error("invalid port number: {0}")]
    InvalidPortNo(String),

    #[error("truncated input: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
}
