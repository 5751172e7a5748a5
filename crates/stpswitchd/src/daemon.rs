//! Event loop: per-switch mailboxes feeding the controller.
//!
//! The loop reads the merged event stream and forwards each event to a
//! worker task owned by the event's switch. One worker per switch keeps
//! same-switch events in arrival order while different switches proceed
//! in parallel.

use sonic_types::DatapathId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::config::EventLoopConfig;
use crate::controller::{Controller, StatsSnapshot};
use crate::error::{Result, StpSwitchError};
use crate::event::ControllerEvent;

/// Drives a [`Controller`] from an event stream.
pub struct EventLoop {
    controller: Arc<Controller>,
    config: EventLoopConfig,
}

impl EventLoop {
    pub fn new(controller: Arc<Controller>, config: EventLoopConfig) -> Self {
        Self { controller, config }
    }

    /// Runs until `events` closes, then drains every mailbox and waits for
    /// all workers.
    pub async fn run(self, mut events: mpsc::Receiver<ControllerEvent>) -> Result<StatsSnapshot> {
        let mut mailboxes: HashMap<DatapathId, mpsc::Sender<ControllerEvent>> = HashMap::new();
        let mut workers = JoinSet::new();

        info!(
            "Event loop started (mailbox depth {})",
            self.config.mailbox_depth
        );

        while let Some(event) = events.recv().await {
            let dpid = event.dpid();
            let mailbox = mailboxes.entry(dpid).or_insert_with(|| {
                debug!("Spawning worker for dpid={}", dpid);
                let (tx, rx) = mpsc::channel(self.config.mailbox_depth);
                workers.spawn(switch_worker(dpid, Arc::clone(&self.controller), rx));
                tx
            });

            // A full mailbox holds up the dispatcher, and with it every
            // other switch, until this switch's worker catches up.
            let delivered = match mailbox.try_send(event) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(event)) => {
                    warn!(
                        "Mailbox for dpid={} full ({} events); dispatcher waiting",
                        dpid, self.config.mailbox_depth
                    );
                    mailbox.send(event).await.map_err(|_| ())
                }
                Err(TrySendError::Closed(_)) => Err(()),
            };
            if delivered.is_err() {
                return Err(StpSwitchError::internal(format!(
                    "worker for dpid={} exited early",
                    dpid
                )));
            }
        }

        info!("Event stream closed; draining {} switch workers", mailboxes.len());
        drop(mailboxes);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Switch worker failed: {}", e);
                return Err(StpSwitchError::internal(format!("switch worker failed: {}", e)));
            }
        }

        Ok(self.controller.stats())
    }
}

async fn switch_worker(
    dpid: DatapathId,
    controller: Arc<Controller>,
    mut mailbox: mpsc::Receiver<ControllerEvent>,
) {
    let mut handled = 0u64;
    while let Some(event) = mailbox.recv().await {
        trace!("dpid={} dispatching {}", dpid, event.kind());
        controller.dispatch(event);
        handled += 1;
    }
    debug!("Worker for dpid={} done after {} events", dpid, handled);
}
