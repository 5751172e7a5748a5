//! Per-switch forwarding tables (MAC → ingress port).
//!
//! Each switch owns one [`ForwardingTable`] behind its own mutex; the
//! [`FdbRegistry`] only maps datapath IDs to those handles. Operations on
//! different switches never contend on a shared lock, while everything
//! touching one switch's table is serialized by that switch's mutex.

use dashmap::DashMap;
use parking_lot::Mutex;
use sonic_types::{DatapathId, MacAddress, PortNo};
use std::collections::HashMap;
use std::sync::Arc;

/// Learned MAC → ingress port mapping for a single switch.
///
/// At most one port is recorded per MAC; the latest observation wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingTable {
    entries: HashMap<MacAddress, PortNo>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `mac` was seen on `port`, replacing any previous port.
    ///
    /// Returns the port previously recorded for `mac`, if any.
    pub fn learn(&mut self, mac: MacAddress, port: PortNo) -> Option<PortNo> {
        self.entries.insert(mac, port)
    }

    /// Returns the port `mac` was last seen on.
    pub fn lookup(&self, mac: &MacAddress) -> Option<PortNo> {
        self.entries.get(mac).copied()
    }

    /// Removes every entry and returns the MACs that were present.
    pub fn flush(&mut self) -> Vec<MacAddress> {
        let mut macs: Vec<MacAddress> = self.entries.drain().map(|(mac, _)| mac).collect();
        macs.sort_unstable();
        macs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MacAddress, &PortNo)> {
        self.entries.iter()
    }
}

/// Shared handle to one switch's table.
pub type TableHandle = Arc<Mutex<ForwardingTable>>;

/// Registry of forwarding tables keyed by switch identity.
///
/// A switch gets a handle the first time a frame is learned on it and
/// keeps it for the life of the process. A flushed (empty) table and an
/// absent one behave the same for lookups, and [`FdbRegistry::has_table`]
/// reports both as absent.
#[derive(Debug, Default)]
pub struct FdbRegistry {
    tables: DashMap<DatapathId, TableHandle>,
}

impl FdbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `dpid`, creating an empty table on first use.
    ///
    /// The registry shard lock is released before the handle is returned,
    /// so callers never hold it while locking the table.
    pub fn table(&self, dpid: DatapathId) -> TableHandle {
        if let Some(handle) = self.tables.get(&dpid) {
            return Arc::clone(handle.value());
        }
        Arc::clone(self.tables.entry(dpid).or_default().value())
    }

    /// Returns the handle for `dpid` without creating one.
    pub fn existing_table(&self, dpid: DatapathId) -> Option<TableHandle> {
        self.tables.get(&dpid).map(|h| Arc::clone(h.value()))
    }

    /// Runs `f` inside `dpid`'s critical section.
    pub fn with_table<R>(&self, dpid: DatapathId, f: impl FnOnce(&mut ForwardingTable) -> R) -> R {
        let handle = self.table(dpid);
        let mut table = handle.lock();
        f(&mut table)
    }

    /// Records `mac` on `port` for `dpid`. Always succeeds.
    pub fn learn(&self, dpid: DatapathId, mac: MacAddress, port: PortNo) {
        self.with_table(dpid, |table| {
            table.learn(mac, port);
        });
    }

    /// Returns the port `mac` was learned on for `dpid`, if any.
    pub fn lookup(&self, dpid: DatapathId, mac: &MacAddress) -> Option<PortNo> {
        self.existing_table(dpid)
            .and_then(|handle| handle.lock().lookup(mac))
    }

    /// Empties `dpid`'s table and returns the MACs that were present.
    ///
    /// Idempotent: flushing an absent or empty table returns nothing.
    pub fn flush(&self, dpid: DatapathId) -> Vec<MacAddress> {
        self.flush_with(dpid, |_| ())
            .map(|(flushed, ())| flushed)
            .unwrap_or_default()
    }

    /// Empties `dpid`'s table and runs `f` on the flushed MACs (sorted)
    /// before releasing the critical section.
    ///
    /// Returns `None` without calling `f` when the table is absent or
    /// already empty.
    pub fn flush_with<R>(
        &self,
        dpid: DatapathId,
        f: impl FnOnce(&[MacAddress]) -> R,
    ) -> Option<(Vec<MacAddress>, R)> {
        let handle = self.existing_table(dpid)?;
        let mut table = handle.lock();
        if table.is_empty() {
            return None;
        }
        let flushed = table.flush();
        let result = f(&flushed);
        Some((flushed, result))
    }

    /// Returns true when `dpid` has learned at least one MAC since its last flush.
    pub fn has_table(&self, dpid: DatapathId) -> bool {
        self.existing_table(dpid)
            .map(|handle| !handle.lock().is_empty())
            .unwrap_or(false)
    }

    /// Returns a copy of `dpid`'s table (empty if absent).
    pub fn snapshot(&self, dpid: DatapathId) -> ForwardingTable {
        self.existing_table(dpid)
            .map(|handle| handle.lock().clone())
            .unwrap_or_default()
    }

    /// Number of switches with a non-empty table.
    pub fn active_switches(&self) -> usize {
        self.tables
            .iter()
            .filter(|entry| !entry.value().lock().is_empty())
            .count()
    }
}
