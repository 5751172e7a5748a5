//! OpenFlow 1.3 command model emitted toward the switch-control layer.
//!
//! These are descriptions of messages, not wire encodings. Encoding,
//! session handling and delivery belong to the transport that consumes
//! [`SwitchCommand`]s.

use serde::{Deserialize, Serialize};
use sonic_types::{DatapathId, MacAddress, PortNo};

/// Buffer ID meaning "the packet was not buffered by the switch".
pub const OFP_NO_BUFFER: u32 = 0xffff_ffff;

/// Wildcard group used in flow deletes.
pub const OFPG_ANY: u32 = 0xffff_ffff;

/// Largest `max_len` usable for controller output before buffering kicks in.
pub const OFPCML_MAX: u16 = 0xffe5;

/// `max_len` requesting the full packet be sent to the controller.
pub const OFPCML_NO_BUFFER: u16 = 0xffff;

/// Priority of the rules mirrored from the forwarding table.
pub const LEARNED_RULE_PRIORITY: u16 = 1;

/// Priority of the catch-all rule that punts unknown traffic to the controller.
pub const TABLE_MISS_PRIORITY: u16 = 0;

/// Match fields used by this controller. Absent fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_port: Option<PortNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eth_dst: Option<MacAddress>,
}

impl FlowMatch {
    /// Match on everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match on destination MAC only, any ingress port.
    pub fn eth_dst(dst: MacAddress) -> Self {
        Self {
            in_port: None,
            eth_dst: Some(dst),
        }
    }

    /// Match on ingress port and destination MAC.
    pub fn in_port_eth_dst(in_port: PortNo, dst: MacAddress) -> Self {
        Self {
            in_port: Some(in_port),
            eth_dst: Some(dst),
        }
    }
}

/// Apply-actions used by this controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Output { port: PortNo, max_len: u16 },
}

impl Action {
    /// Output to `port` with the default `max_len`.
    pub fn output(port: PortNo) -> Self {
        Action::Output {
            port,
            max_len: OFPCML_MAX,
        }
    }

    /// Output to the controller carrying the full frame.
    pub fn to_controller() -> Self {
        Action::Output {
            port: PortNo::CONTROLLER,
            max_len: OFPCML_NO_BUFFER,
        }
    }
}

/// Flow-mod command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowModCommand {
    Add,
    /// Non-strict delete: removes every rule the match covers.
    Delete,
}

/// A flow-table modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMod {
    pub command: FlowModCommand,
    pub priority: u16,
    #[serde(rename = "match")]
    pub flow_match: FlowMatch,
    pub actions: Vec<Action>,
    pub out_port: PortNo,
    pub out_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_id: Option<u32>,
}

impl FlowMod {
    /// Builds an add with apply-actions.
    pub fn add(priority: u16, flow_match: FlowMatch, actions: Vec<Action>) -> Self {
        Self {
            command: FlowModCommand::Add,
            priority,
            flow_match,
            actions,
            out_port: PortNo::ANY,
            out_group: OFPG_ANY,
            buffer_id: None,
        }
    }

    /// Builds a non-strict delete, wildcarding output port and group.
    pub fn delete(priority: u16, flow_match: FlowMatch) -> Self {
        Self {
            command: FlowModCommand::Delete,
            priority,
            flow_match,
            actions: Vec::new(),
            out_port: PortNo::ANY,
            out_group: OFPG_ANY,
            buffer_id: None,
        }
    }
}

/// Where the packet-out frame comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketPayload {
    /// Frame held in the switch's buffer.
    Buffered(u32),
    /// Frame bytes carried in the message.
    Raw(Vec<u8>),
}

impl PacketPayload {
    /// Picks the buffered reference when the switch kept the frame,
    /// otherwise carries the raw bytes.
    pub fn from_packet_in(buffer_id: Option<u32>, data: &[u8]) -> Self {
        match buffer_id {
            Some(id) if id != OFP_NO_BUFFER => PacketPayload::Buffered(id),
            _ => PacketPayload::Raw(data.to_vec()),
        }
    }
}

/// A packet-out instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketOut {
    pub in_port: PortNo,
    pub payload: PacketPayload,
    pub actions: Vec<Action>,
}

/// Message body addressed to one switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwitchMessage {
    FlowMod(FlowMod),
    PacketOut(PacketOut),
}

/// A command for the switch-control layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCommand {
    pub dpid: DatapathId,
    pub message: SwitchMessage,
}

impl SwitchCommand {
    pub fn flow_mod(dpid: DatapathId, flow_mod: FlowMod) -> Self {
        Self {
            dpid,
            message: SwitchMessage::FlowMod(flow_mod),
        }
    }

    pub fn packet_out(dpid: DatapathId, packet_out: PacketOut) -> Self {
        Self {
            dpid,
            message: SwitchMessage::PacketOut(packet_out),
        }
    }

    /// Returns the flow-mod body, if this is one.
    pub fn as_flow_mod(&self) -> Option<&FlowMod> {
        match &self.message {
            SwitchMessage::FlowMod(fm) => Some(fm),
            SwitchMessage::PacketOut(_) => None,
        }
    }

    /// Returns the packet-out body, if this is one.
    pub fn as_packet_out(&self) -> Option<&PacketOut> {
        match &self.message {
            SwitchMessage::PacketOut(po) => Some(po),
            SwitchMessage::FlowMod(_) => None,
        }
    }
}
