//! Events delivered to the controller by its collaborators.

use serde::{Deserialize, Serialize};
use sonic_types::{DatapathId, PortNo};

/// One inbound event, from either the switch-control layer or the STP engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// A switch finished its handshake.
    SwitchFeatures { dpid: DatapathId },

    /// A frame punted to the controller.
    PacketIn {
        dpid: DatapathId,
        #[serde(default)]
        in_port: Option<PortNo>,
        #[serde(default)]
        buffer_id: Option<u32>,
        #[serde(default)]
        data: Vec<u8>,
    },

    /// The STP engine reported a topology change on a switch.
    TopologyChange { dpid: DatapathId },

    /// The STP engine moved a port to a new state.
    ///
    /// `state` is the engine's raw code; unknown codes are still delivered.
    PortStateChange {
        dpid: DatapathId,
        port: PortNo,
        state: u8,
    },
}

impl ControllerEvent {
    /// The switch this event concerns.
    pub fn dpid(&self) -> DatapathId {
        match self {
            Self::SwitchFeatures { dpid }
            | Self::PacketIn { dpid, .. }
            | Self::TopologyChange { dpid }
            | Self::PortStateChange { dpid, .. } => *dpid,
        }
    }

    /// Short name for logs and stats.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SwitchFeatures { .. } => "switch_features",
            Self::PacketIn { .. } => "packet_in",
            Self::TopologyChange { .. } => "topology_change",
            Self::PortStateChange { .. } => "port_state_change",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_packet_in_line() {
        let line = r#"{"event":"packet_in","dpid":"0000000000000001","in_port":2,"data":[1,2,3]}"#;
        let event: ControllerEvent = serde_json::from_str(line).unwrap();
        assert_eq!(
            event,
            ControllerEvent::PacketIn {
                dpid: DatapathId::new(1),
                in_port: Some(PortNo::new(2)),
                buffer_id: None,
                data: vec![1, 2, 3],
            }
        );
        assert_eq!(event.kind(), "packet_in");
    }

    #[test]
    fn test_parse_port_state_line_with_unknown_code() {
        let line = r#"{"event":"port_state_change","dpid":"0000000000000002","port":3,"state":42}"#;
        let event: ControllerEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.dpid(), DatapathId::new(2));
        assert!(matches!(event, ControllerEvent::PortStateChange { state: 42, .. }));
    }

    #[test]
    fn test_packet_in_without_port_parses() {
        let line = r#"{"event":"packet_in","dpid":"01"}"#;
        let event: ControllerEvent = serde_json::from_str(line).unwrap();
        assert!(matches!(
            event,
            ControllerEvent::PacketIn { in_port: None, .. }
        ));
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let line = r#"{"event":"port_added","dpid":"01"}"#;
        assert!(serde_json::from_str::<ControllerEvent>(line).is_err());
    }
}
