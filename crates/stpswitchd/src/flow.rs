//! Flow rule installer.
//!
//! Turns forwarding decisions into flow-mods. Rules are installed and
//! deleted fire-and-forget; a rejected command is logged and counted,
//! never retried.

use sonic_types::{DatapathId, MacAddress, PortNo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::openflow::{
    Action, FlowMatch, FlowMod, SwitchCommand, LEARNED_RULE_PRIORITY, TABLE_MISS_PRIORITY,
};
use crate::sink::CommandSink;

/// Installer statistics.
#[derive(Debug, Default)]
pub struct FlowInstallerStats {
    pub rules_installed: AtomicU64,
    pub rules_deleted: AtomicU64,
    pub delivery_failures: AtomicU64,
}

/// Translates learned decisions into flow-table rules on a switch.
pub struct FlowRuleInstaller {
    sink: Arc<dyn CommandSink>,
    stats: FlowInstallerStats,
}

impl FlowRuleInstaller {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sink,
            stats: FlowInstallerStats::default(),
        }
    }

    pub fn stats(&self) -> &FlowInstallerStats {
        &self.stats
    }

    /// Hands a command to the sink without waiting for the switch.
    ///
    /// Returns false when the sink rejected it.
    pub fn send(&self, command: SwitchCommand) -> bool {
        match self.sink.send(command) {
            Ok(()) => true,
            Err(e) => {
                self.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Command delivery failed (retryable={}): {}", e.is_retryable(), e);
                false
            }
        }
    }

    /// Mirrors a learned entry: frames entering on `in_port` for `dst`
    /// go out `out_port` without reaching the controller.
    pub fn install_learned(
        &self,
        dpid: DatapathId,
        in_port: PortNo,
        dst: MacAddress,
        out_port: PortNo,
    ) -> bool {
        let flow_mod = FlowMod::add(
            LEARNED_RULE_PRIORITY,
            FlowMatch::in_port_eth_dst(in_port, dst),
            vec![Action::output(out_port)],
        );
        let sent = self.send(SwitchCommand::flow_mod(dpid, flow_mod));
        if sent {
            self.stats.rules_installed.fetch_add(1, Ordering::Relaxed);
        }
        sent
    }

    /// Deletes the learned rules for each destination in `dsts`, on any
    /// ingress port.
    ///
    /// Every deletion is attempted even if earlier ones fail. Returns the
    /// number handed to the sink.
    pub fn delete_learned(&self, dpid: DatapathId, dsts: &[MacAddress]) -> usize {
        let mut sent = 0;
        for dst in dsts {
            let flow_mod = FlowMod::delete(LEARNED_RULE_PRIORITY, FlowMatch::eth_dst(*dst));
            if self.send(SwitchCommand::flow_mod(dpid, flow_mod)) {
                sent += 1;
            }
        }
        self.stats
            .rules_deleted
            .fetch_add(sent as u64, Ordering::Relaxed);
        sent
    }

    /// Installs the lowest-priority catch-all that sends unmatched frames
    /// to the controller.
    pub fn install_table_miss(&self, dpid: DatapathId) -> bool {
        let flow_mod = FlowMod::add(
            TABLE_MISS_PRIORITY,
            FlowMatch::any(),
            vec![Action::to_controller()],
        );
        self.send(SwitchCommand::flow_mod(dpid, flow_mod))
    }
}
