//! STP port-state observer.
//!
//! Purely informational: turns engine port-state events into operator
//! records. It never touches forwarding state.

use sonic_types::{DatapathId, PortNo};
use std::fmt;
use tracing::{debug, warn};

use crate::stp::StpPortState;

/// Translated state: a known STP state, or the raw code the engine sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservedState {
    Known(StpPortState),
    Unrecognized(u8),
}

impl ObservedState {
    pub fn from_raw(code: u8) -> Self {
        match StpPortState::from_raw(code) {
            Some(state) => Self::Known(state),
            None => Self::Unrecognized(code),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(state) => write!(f, "{}", state),
            Self::Unrecognized(code) => write!(f, "UNKNOWN({})", code),
        }
    }
}

/// Human-readable record of one port-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortStateRecord {
    pub dpid: DatapathId,
    pub port: PortNo,
    pub state: ObservedState,
}

impl fmt::Display for PortStateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[dpid={}][port={}] state={}",
            self.dpid, self.port, self.state
        )
    }
}

/// Logs STP port-state transitions.
#[derive(Debug, Default)]
pub struct PortStateObserver;

impl PortStateObserver {
    pub fn new() -> Self {
        Self
    }

    /// Records a transition. Unrecognized codes are reported as anomalies
    /// and otherwise handled like any other transition.
    pub fn observe(&self, dpid: DatapathId, port: PortNo, code: u8) -> PortStateRecord {
        let record = PortStateRecord {
            dpid,
            port,
            state: ObservedState::from_raw(code),
        };

        if record.state.is_known() {
            debug!("{}", record);
        } else {
            warn!("{} (unrecognized STP port state code {})", record, code);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_forward_record() {
        let record = PortStateObserver::new().observe(DatapathId::new(2), PortNo::new(3), 4);
        assert_eq!(record.state, ObservedState::Known(StpPortState::Forward));
        assert_eq!(
            record.to_string(),
            "[dpid=0000000000000002][port=3] state=FORWARD"
        );
    }

    #[test]
    fn test_every_known_state_has_a_name() {
        let observer = PortStateObserver::new();
        let names: Vec<String> = (0..=4)
            .map(|code| observer.observe(DatapathId::new(1), PortNo::new(1), code).state.to_string())
            .collect();
        assert_eq!(names, vec!["DISABLE", "BLOCK", "LISTEN", "LEARN", "FORWARD"]);
    }

    #[test]
    fn test_unrecognized_state_is_reported_not_fatal() {
        let record = PortStateObserver::new().observe(DatapathId::new(1), PortNo::new(7), 9);
        assert_eq!(record.state, ObservedState::Unrecognized(9));
        assert!(!record.state.is_known());
        assert!(record.to_string().contains("UNKNOWN(9)"));
    }
}
