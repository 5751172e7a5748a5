//! JSON-lines process I/O.
//!
//! The daemon's collaborators attach over plain streams: events arrive one
//! JSON object per line, and every [`Outbound`] record leaves the same way.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::event::ControllerEvent;
use crate::sink::Outbound;

/// Counters for one input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub events: u64,
    pub malformed: u64,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_event_line(line: &str) -> Option<std::result::Result<ControllerEvent, serde_json::Error>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Reads events from `input` until EOF, forwarding them to `events`.
///
/// Malformed lines are logged and skipped. Stops early if the receiver
/// is gone.
pub async fn read_events<R>(input: R, events: mpsc::Sender<ControllerEvent>) -> Result<ReaderStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReaderStats::default();
    let mut lines = input.lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_event_line(&line) {
            None => continue,
            Some(Ok(event)) => {
                stats.events += 1;
                if events.send(event).await.is_err() {
                    debug!("Event receiver closed; stopping input at line {}", line_no);
                    break;
                }
            }
            Some(Err(e)) => {
                stats.malformed += 1;
                warn!("Skipping malformed event on line {}: {}", line_no, e);
            }
        }
    }

    Ok(stats)
}

/// Queued-record count at which the writer first reports a backlog.
pub const OUTPUT_BACKLOG_WARN: usize = 4096;

/// Tracks how far the output channel has fallen behind.
///
/// Reports once each time the backlog doubles past the previous report,
/// and re-arms after the backlog drains below the threshold.
#[derive(Debug, Clone, Copy)]
pub struct BacklogMonitor {
    threshold: usize,
    next_report: usize,
    high_water: usize,
}

impl BacklogMonitor {
    pub fn new(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            threshold,
            next_report: threshold,
            high_water: 0,
        }
    }

    /// Records the current queue length. Returns true when it should be
    /// reported.
    pub fn observe(&mut self, queued: usize) -> bool {
        self.high_water = self.high_water.max(queued);
        if queued < self.threshold {
            self.next_report = self.threshold;
            return false;
        }
        if queued < self.next_report {
            return false;
        }
        self.next_report = queued.saturating_mul(2);
        true
    }

    /// Largest queue length observed.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}

/// Writes every outbound record to `output` as one JSON line, until the
/// channel closes. Returns the number of records written.
///
/// A growing backlog (the consumer of `output` not keeping up) is logged
/// at warn.
pub async fn write_outbound<W>(mut records: mpsc::UnboundedReceiver<Outbound>, mut output: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    let mut backlog = BacklogMonitor::new(OUTPUT_BACKLOG_WARN);
    while let Some(record) = records.recv().await {
        let queued = records.len();
        if backlog.observe(queued) {
            warn!("Output backlog at {} queued records", queued);
        }
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        written += 1;
    }
    output.flush().await?;
    debug!(
        "Output closed after {} records (peak backlog {})",
        written,
        backlog.high_water()
    );
    Ok(written)
}
