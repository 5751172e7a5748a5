//! Packet arrival handling: MAC learning and the flood-vs-unicast decision.

use sonic_types::{DatapathId, PortNo};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::ethernet::{EthernetHeader, FrameError};
use crate::fdb::FdbRegistry;
use crate::flow::FlowRuleInstaller;
use crate::openflow::{Action, PacketOut, PacketPayload, SwitchCommand};

/// A frame punted to the controller by a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIn {
    pub dpid: DatapathId,
    /// Missing when the switch did not report the ingress port.
    pub in_port: Option<PortNo>,
    /// Switch-side buffer holding the frame, if any.
    pub buffer_id: Option<u32>,
    pub data: Vec<u8>,
}

/// Why a packet-in was dropped without effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingInPort,
    Unparseable(FrameError),
}

/// What the handler did with one arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketInOutcome {
    /// Destination unknown: flooded, no rule installed.
    Flooded,
    /// Destination known on `out_port`: unicast and rule installed.
    Unicast { out_port: PortNo, rule_installed: bool },
    /// Dropped before touching the table.
    Dropped(DropReason),
}

/// Learns source addresses and forwards frames.
pub struct PacketInHandler {
    fdb: Arc<FdbRegistry>,
    installer: Arc<FlowRuleInstaller>,
}

impl PacketInHandler {
    pub fn new(fdb: Arc<FdbRegistry>, installer: Arc<FlowRuleInstaller>) -> Self {
        Self { fdb, installer }
    }

    /// Learns the source, picks an output and emits exactly one packet-out.
    ///
    /// Learn, lookup and the resulting commands happen inside the switch's
    /// critical section, so a concurrent topology flush is seen either
    /// entirely before or entirely after this arrival.
    #[instrument(skip(self, packet), fields(dpid = %packet.dpid))]
    pub fn handle(&self, packet: &PacketIn) -> PacketInOutcome {
        let Some(in_port) = packet.in_port else {
            debug!("Dropping packet-in without ingress port");
            return PacketInOutcome::Dropped(DropReason::MissingInPort);
        };

        let eth = match EthernetHeader::parse(&packet.data) {
            Ok(eth) => eth,
            Err(e) => {
                debug!("Dropping unparseable frame on port {}: {}", in_port, e);
                return PacketInOutcome::Dropped(DropReason::Unparseable(e));
            }
        };

        info!(
            "packet in dpid={} src={} dst={} in_port={}",
            packet.dpid, eth.src, eth.dst, in_port
        );

        self.fdb.with_table(packet.dpid, |table| {
            table.learn(eth.src, in_port);

            match table.lookup(&eth.dst) {
                Some(out_port) => {
                    let rule_installed =
                        self.installer
                            .install_learned(packet.dpid, in_port, eth.dst, out_port);
                    self.packet_out(packet, in_port, out_port);
                    PacketInOutcome::Unicast {
                        out_port,
                        rule_installed,
                    }
                }
                None => {
                    self.packet_out(packet, in_port, PortNo::FLOOD);
                    PacketInOutcome::Flooded
                }
            }
        })
    }

    fn packet_out(&self, packet: &PacketIn, in_port: PortNo, out_port: PortNo) {
        let packet_out = PacketOut {
            in_port,
            payload: PacketPayload::from_packet_in(packet.buffer_id, &packet.data),
            actions: vec![Action::output(out_port)],
        };
        self.installer
            .send(SwitchCommand::packet_out(packet.dpid, packet_out));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_types::MacAddress;
    use crate::openflow::{FlowMatch, FlowModCommand, LEARNED_RULE_PRIORITY};
    use crate::sink::MemorySink;
    use pretty_assertions::assert_eq;

    const S1: DatapathId = DatapathId::new(1);

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0xaa, 0xaa, 0xaa, 0xaa, 0xaa, last])
    }

    fn frame(src: MacAddress, dst: MacAddress) -> Vec<u8> {
        EthernetHeader {
            dst,
            src,
            ethertype: 0x0800,
        }
        .build_frame(&[0u8; 46])
    }

    fn packet(in_port: u32, src: u8, dst: u8) -> PacketIn {
        PacketIn {
            dpid: S1,
            in_port: Some(PortNo::new(in_port)),
            buffer_id: None,
            data: frame(mac(src), mac(dst)),
        }
    }

    fn handler() -> (PacketInHandler, Arc<FdbRegistry>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let fdb = Arc::new(FdbRegistry::new());
        let installer = Arc::new(FlowRuleInstaller::new(sink.clone()));
        (PacketInHandler::new(fdb.clone(), installer), fdb, sink)
    }

    #[test]
    fn test_unknown_destination_floods() {
        let (handler, fdb, sink) = handler();

        assert_eq!(handler.handle(&packet(1, 1, 2)), PacketInOutcome::Flooded);
        assert_eq!(fdb.lookup(S1, &mac(1)), Some(PortNo::new(1)));

        let commands = sink.commands();
        assert_eq!(commands.len(), 1);
        let po = commands[0].as_packet_out().unwrap();
        assert_eq!(po.actions, vec![Action::output(PortNo::FLOOD)]);
        assert_eq!(po.in_port, PortNo::new(1));
    }

    #[test]
    fn test_known_destination_unicasts_and_installs_rule() {
        let (handler, _fdb, sink) = handler();
        handler.handle(&packet(1, 1, 0xff));
        sink.take();

        let outcome = handler.handle(&packet(2, 2, 1));
        assert_eq!(
            outcome,
            PacketInOutcome::Unicast {
                out_port: PortNo::new(1),
                rule_installed: true
            }
        );

        let commands = sink.commands();
        assert_eq!(commands.len(), 2);
        let fm = commands[0].as_flow_mod().unwrap();
        assert_eq!(fm.command, FlowModCommand::Add);
        assert_eq!(fm.priority, LEARNED_RULE_PRIORITY);
        assert_eq!(fm.flow_match, FlowMatch::in_port_eth_dst(PortNo::new(2), mac(1)));
        let po = commands[1].as_packet_out().unwrap();
        assert_eq!(po.actions, vec![Action::output(PortNo::new(1))]);
    }

    #[test]
    fn test_buffered_frame_is_referenced_not_copied() {
        let (handler, _fdb, sink) = handler();
        let mut pkt = packet(1, 1, 2);
        pkt.buffer_id = Some(256);
        handler.handle(&pkt);

        let po = sink.commands()[0].as_packet_out().cloned().unwrap();
        assert_eq!(po.payload, PacketPayload::Buffered(256));
    }

    #[test]
    fn test_unbuffered_frame_carries_raw_bytes() {
        let (handler, _fdb, sink) = handler();
        let pkt = packet(1, 1, 2);
        handler.handle(&pkt);

        let po = sink.commands()[0].as_packet_out().cloned().unwrap();
        assert_eq!(po.payload, PacketPayload::Raw(pkt.data));
    }

    #[test]
    fn test_source_moves_to_new_port() {
        let (handler, fdb, _sink) = handler();
        handler.handle(&packet(1, 1, 2));
        handler.handle(&packet(3, 1, 2));
        assert_eq!(fdb.lookup(S1, &mac(1)), Some(PortNo::new(3)));
    }

    #[test]
    fn test_short_frame_is_dropped_without_side_effects() {
        let (handler, fdb, sink) = handler();
        let pkt = PacketIn {
            dpid: S1,
            in_port: Some(PortNo::new(1)),
            buffer_id: None,
            data: vec![0xaa; 10],
        };

        assert_eq!(
            handler.handle(&pkt),
            PacketInOutcome::Dropped(DropReason::Unparseable(FrameError::TooShort { len: 10 }))
        );
        assert!(!fdb.has_table(S1));
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_missing_in_port_is_dropped() {
        let (handler, fdb, sink) = handler();
        let mut pkt = packet(1, 1, 2);
        pkt.in_port = None;

        assert_eq!(
            handler.handle(&pkt),
            PacketInOutcome::Dropped(DropReason::MissingInPort)
        );
        assert!(fdb.existing_table(S1).is_none());
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_rule_install_failure_still_forwards() {
        let (handler, fdb, sink) = handler();
        handler.handle(&packet(1, 1, 2));
        sink.set_failing(true);

        let outcome = handler.handle(&packet(2, 2, 1));
        assert_eq!(
            outcome,
            PacketInOutcome::Unicast {
                out_port: PortNo::new(1),
                rule_installed: false
            }
        );
        assert_eq!(fdb.lookup(S1, &mac(2)), Some(PortNo::new(2)));
    }
}
