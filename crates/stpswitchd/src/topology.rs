//! Topology change reaction: forget everything learned on a switch.
//!
//! After an STP reconvergence the loop-free tree may have moved, so any
//! learned port (and every rule mirroring one) can now loop or black-hole
//! traffic. The reactor deletes those rules and empties the table in one
//! critical section.

use sonic_types::DatapathId;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::fdb::FdbRegistry;
use crate::flow::FlowRuleInstaller;

/// Result of one topology-change reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChangeOutcome {
    /// Nothing was learned on the switch; nothing to do.
    NoTable,
    /// The table was flushed.
    Flushed {
        /// Destinations whose rules were targeted for deletion.
        entries: usize,
        /// Deletions handed to the switch-control layer.
        rules_deleted: usize,
    },
}

/// Flushes a switch's forwarding knowledge on topology change.
pub struct TopologyChangeReactor {
    fdb: Arc<FdbRegistry>,
    installer: Arc<FlowRuleInstaller>,
}

impl TopologyChangeReactor {
    pub fn new(fdb: Arc<FdbRegistry>, installer: Arc<FlowRuleInstaller>) -> Self {
        Self { fdb, installer }
    }

    /// Empties the table and deletes the mirrored rule for every
    /// destination it held, inside one critical section.
    ///
    /// Failed deletions do not undo the flush.
    #[instrument(skip(self), fields(dpid = %dpid))]
    pub fn on_topology_change(&self, dpid: DatapathId) -> TopologyChangeOutcome {
        debug!("[dpid={}] Topology changed, clearing MAC table.", dpid);

        let flushed = self.fdb.flush_with(dpid, |dsts| {
            self.installer.delete_learned(dpid, dsts)
        });
        let Some((dsts, rules_deleted)) = flushed else {
            return TopologyChangeOutcome::NoTable;
        };

        if rules_deleted < dsts.len() {
            warn!(
                "[dpid={}] {} of {} rule deletions not delivered; table flushed anyway",
                dpid,
                dsts.len() - rules_deleted,
                dsts.len()
            );
        }

        TopologyChangeOutcome::Flushed {
            entries: dsts.len(),
            rules_deleted,
        }
    }
}
