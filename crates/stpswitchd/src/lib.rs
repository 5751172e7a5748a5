//! # stpswitchd - STP-aware L2 learning switch controller
//!
//! Forwarding-decision core of an OpenFlow controller application that
//! cooperates with an external Spanning Tree Protocol engine to keep a
//! multi-switch topology loop-free.
//!
//! ## Responsibilities
//! - MAC learning into a per-switch forwarding table
//! - Flood-vs-unicast decisions, mirroring known destinations into flow rules
//! - Flushing a switch's table and its mirrored rules on STP topology change
//! - Reporting STP port-state transitions to the operator
//!
//! ## Collaborators
//! - Switch-control layer: delivers switch-features and packet-in events,
//!   consumes [`SwitchCommand`]s (flow-mod, packet-out)
//! - STP engine: receives the bridge configuration at startup, raises
//!   topology-change and port-state events
//!
//! ## Concurrency
//! Each switch's table sits behind its own lock inside [`FdbRegistry`];
//! the [`EventLoop`] gives every switch its own ordered mailbox so
//! different switches are handled in parallel.

pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod ethernet;
pub mod event;
pub mod fdb;
pub mod flow;
pub mod openflow;
pub mod packet_in;
pub mod port_state;
pub mod replay;
pub mod sink;
pub mod stp;
pub mod topology;

pub use config::{LogFormat, StpSwitchConfig};
pub use controller::{Controller, EventOutcome, StatsSnapshot};
pub use daemon::EventLoop;
pub use error::{Result, StpSwitchError};
pub use event::ControllerEvent;
pub use fdb::{FdbRegistry, ForwardingTable};
pub use flow::FlowRuleInstaller;
pub use openflow::{SwitchCommand, SwitchMessage};
pub use packet_in::{PacketIn, PacketInHandler, PacketInOutcome};
pub use port_state::{ObservedState, PortStateObserver, PortStateRecord};
pub use sink::{ChannelSink, CommandSink, MemorySink, Outbound};
pub use stp::{BridgeConfig, StpConfig, StpEngine, StpPortState};
pub use topology::{TopologyChangeOutcome, TopologyChangeReactor};

pub use sonic_types::{DatapathId, MacAddress, PortNo};
