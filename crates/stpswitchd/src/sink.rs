//! Command channel toward the switch-control layer.
//!
//! Every command is fire-and-forget: a sink hands the command off and
//! returns without waiting for the switch. Handlers call sinks while they
//! hold a switch's table lock, so `send` must never block.

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, StpSwitchError};
use crate::openflow::SwitchCommand;
use crate::stp::{StpConfig, StpEngine};

/// Receives commands addressed to switches.
pub trait CommandSink: Send + Sync {
    /// Hands `command` to the transport. Must not block.
    fn send(&self, command: SwitchCommand) -> Result<()>;
}

/// Everything the controller emits toward its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    /// Command for one switch.
    Command(SwitchCommand),
    /// Startup configuration push to the STP engine.
    StpConfig(StpConfig),
}

/// Sink backed by an unbounded tokio channel.
///
/// Used by the daemon: a writer task drains the receiver and forwards
/// records to the transport.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl CommandSink for ChannelSink {
    fn send(&self, command: SwitchCommand) -> Result<()> {
        let dpid = command.dpid;
        self.tx
            .send(Outbound::Command(command))
            .map_err(|_| StpSwitchError::command_delivery(dpid, "command channel closed"))
    }
}

impl StpEngine for ChannelSink {
    fn set_config(&self, config: &StpConfig) -> Result<()> {
        debug!("Pushing STP config for {} bridges", config.len());
        self.tx
            .send(Outbound::StpConfig(config.clone()))
            .map_err(|_| StpSwitchError::StpEngine("output channel closed".to_string()))
    }
}

/// Sink that keeps every command in memory.
///
/// Useful for dry runs and tests. Can be switched into a failing mode to
/// exercise delivery-failure handling.
#[derive(Debug, Default)]
pub struct MemorySink {
    commands: Mutex<Vec<SwitchCommand>>,
    stp_configs: Mutex<Vec<StpConfig>>,
    fail: Mutex<bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `send` fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    /// Returns a copy of the recorded commands.
    pub fn commands(&self) -> Vec<SwitchCommand> {
        self.commands.lock().clone()
    }

    /// Removes and returns the recorded commands.
    pub fn take(&self) -> Vec<SwitchCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    /// Returns the recorded STP configuration pushes.
    pub fn stp_configs(&self) -> Vec<StpConfig> {
        self.stp_configs.lock().clone()
    }
}

impl CommandSink for MemorySink {
    fn send(&self, command: SwitchCommand) -> Result<()> {
        if *self.fail.lock() {
            return Err(StpSwitchError::command_delivery(
                command.dpid,
                "switch rejected command",
            ));
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

impl StpEngine for MemorySink {
    fn set_config(&self, config: &StpConfig) -> Result<()> {
        self.stp_configs.lock().push(config.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openflow::{FlowMatch, FlowMod, TABLE_MISS_PRIORITY};
    use pretty_assertions::assert_eq;
    use sonic_types::DatapathId;

    fn table_miss(dpid: u64) -> SwitchCommand {
        SwitchCommand::flow_mod(
            DatapathId::new(dpid),
            FlowMod::add(TABLE_MISS_PRIORITY, FlowMatch::any(), vec![]),
        )
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_commands() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.send(table_miss(1)).unwrap();

        let out = rx.recv().await.unwrap();
        assert_eq!(out, Outbound::Command(table_miss(1)));
    }

    #[test]
    fn test_channel_sink_closed_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);

        let err = sink.send(table_miss(7)).unwrap_err();
        assert!(matches!(err, StpSwitchError::CommandDelivery { dpid, .. } if dpid == DatapathId::new(7)));
        assert!(sink.set_config(&StpConfig::new()).is_err());
    }

    #[test]
    fn test_memory_sink_records_and_fails_on_demand() {
        let sink = MemorySink::new();
        sink.send(table_miss(1)).unwrap();
        assert_eq!(sink.commands().len(), 1);

        sink.set_failing(true);
        assert!(sink.send(table_miss(2)).is_err());
        assert_eq!(sink.take().len(), 1);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_outbound_json_tag() {
        let json = serde_json::to_value(Outbound::StpConfig(StpConfig::new())).unwrap();
        assert_eq!(json["kind"], "stp_config");
    }
}
