//! Controller: routes each event to exactly one handler.
//!
//! The handlers share nothing except the forwarding-table registry and the
//! flow installer, both injected here.

use sonic_types::DatapathId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::event::ControllerEvent;
use crate::fdb::FdbRegistry;
use crate::flow::FlowRuleInstaller;
use crate::packet_in::{PacketIn, PacketInHandler, PacketInOutcome};
use crate::port_state::{PortStateObserver, PortStateRecord};
use crate::sink::CommandSink;
use crate::stp::{StpConfig, StpEngine};
use crate::topology::{TopologyChangeOutcome, TopologyChangeReactor};

/// Event counters.
#[derive(Debug, Default)]
pub struct ControllerStats {
    pub packets_in: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub floods: AtomicU64,
    pub unicasts: AtomicU64,
    pub table_flushes: AtomicU64,
    pub port_state_changes: AtomicU64,
    pub unknown_port_states: AtomicU64,
    pub switches_connected: AtomicU64,
}

/// Plain-value copy of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub packets_in: u64,
    pub frames_dropped: u64,
    pub floods: u64,
    pub unicasts: u64,
    pub rules_installed: u64,
    pub rules_deleted: u64,
    pub table_flushes: u64,
    pub port_state_changes: u64,
    pub unknown_port_states: u64,
    pub switches_connected: u64,
    pub command_failures: u64,
}

/// What dispatching one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    SwitchReady { table_miss_installed: bool },
    PacketIn(PacketInOutcome),
    TopologyChange(TopologyChangeOutcome),
    PortState(PortStateRecord),
}

/// The forwarding-decision core.
pub struct Controller {
    fdb: Arc<FdbRegistry>,
    installer: Arc<FlowRuleInstaller>,
    packet_in: PacketInHandler,
    topology: TopologyChangeReactor,
    port_state: PortStateObserver,
    stats: ControllerStats,
}

impl Controller {
    /// Builds a controller whose commands go to `sink`.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        let fdb = Arc::new(FdbRegistry::new());
        let installer = Arc::new(FlowRuleInstaller::new(sink));
        Self {
            packet_in: PacketInHandler::new(Arc::clone(&fdb), Arc::clone(&installer)),
            topology: TopologyChangeReactor::new(Arc::clone(&fdb), Arc::clone(&installer)),
            port_state: PortStateObserver::new(),
            fdb,
            installer,
            stats: ControllerStats::default(),
        }
    }

    /// Pushes the static bridge configuration to the STP engine.
    pub fn push_stp_config(&self, engine: &dyn StpEngine, config: &StpConfig) -> Result<()> {
        info!("Configuring STP engine with {} bridges", config.len());
        for (dpid, bridge) in &config.bridges {
            info!("  bridge dpid={} priority={:#06x}", dpid, bridge.priority);
        }
        engine.set_config(config)
    }

    /// Routes one event to its handler.
    pub fn dispatch(&self, event: ControllerEvent) -> EventOutcome {
        match event {
            ControllerEvent::SwitchFeatures { dpid } => self.on_switch_features(dpid),
            ControllerEvent::PacketIn {
                dpid,
                in_port,
                buffer_id,
                data,
            } => self.on_packet_in(&PacketIn {
                dpid,
                in_port,
                buffer_id,
                data,
            }),
            ControllerEvent::TopologyChange { dpid } => self.on_topology_change(dpid),
            ControllerEvent::PortStateChange { dpid, port, state } => {
                let record = self.port_state.observe(dpid, port, state);
                self.stats.port_state_changes.fetch_add(1, Ordering::Relaxed);
                if !record.state.is_known() {
                    self.stats.unknown_port_states.fetch_add(1, Ordering::Relaxed);
                }
                EventOutcome::PortState(record)
            }
        }
    }

    fn on_switch_features(&self, dpid: DatapathId) -> EventOutcome {
        info!("Switch connected: dpid={}", dpid);
        self.stats.switches_connected.fetch_add(1, Ordering::Relaxed);
        EventOutcome::SwitchReady {
            table_miss_installed: self.installer.install_table_miss(dpid),
        }
    }

    fn on_packet_in(&self, packet: &PacketIn) -> EventOutcome {
        self.stats.packets_in.fetch_add(1, Ordering::Relaxed);
        let outcome = self.packet_in.handle(packet);
        let counter = match outcome {
            PacketInOutcome::Flooded => &self.stats.floods,
            PacketInOutcome::Unicast { .. } => &self.stats.unicasts,
            PacketInOutcome::Dropped(_) => &self.stats.frames_dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        EventOutcome::PacketIn(outcome)
    }

    fn on_topology_change(&self, dpid: DatapathId) -> EventOutcome {
        let outcome = self.topology.on_topology_change(dpid);
        if matches!(outcome, TopologyChangeOutcome::Flushed { .. }) {
            self.stats.table_flushes.fetch_add(1, Ordering::Relaxed);
        }
        EventOutcome::TopologyChange(outcome)
    }

    /// The forwarding tables, for inspection.
    pub fn fdb(&self) -> &FdbRegistry {
        &self.fdb
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let flow = self.installer.stats();
        StatsSnapshot {
            packets_in: load(&self.stats.packets_in),
            frames_dropped: load(&self.stats.frames_dropped),
            floods: load(&self.stats.floods),
            unicasts: load(&self.stats.unicasts),
            rules_installed: load(&flow.rules_installed),
            rules_deleted: load(&flow.rules_deleted),
            table_flushes: load(&self.stats.table_flushes),
            port_state_changes: load(&self.stats.port_state_changes),
            unknown_port_states: load(&self.stats.unknown_port_states),
            switches_connected: load(&self.stats.switches_connected),
            command_failures: load(&flow.delivery_failures),
        }
    }
}
