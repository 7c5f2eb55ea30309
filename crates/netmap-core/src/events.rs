//! Events published by the mapping coordinator.
//!
//! Observers receive these over a broadcast channel. Each event carries an
//! immutable snapshot of whatever changed, never a handle into
//! coordinator state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp;
use crate::types::{ExportStatus, NetworkDiscoveryDelta, PortScanJobState};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// An event emitted by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorEvent {
    pub id: EventId,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl CoordinatorEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The event payload, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum EventPayload {
    // ── Discovery ─────────────────────────────────────────────
    DiscoveryStarted,
    /// A sweep finished and its hosts replaced the current state.
    DiscoveryCompleted {
        host_count: usize,
        delta: NetworkDiscoveryDelta,
    },
    /// A sweep failed; prior state is untouched.
    DiscoveryFailed { message: String },

    // ── Topology ──────────────────────────────────────────────
    TopologyUpdated { node_count: usize, edge_count: usize },

    // ── Port scans ────────────────────────────────────────────
    JobStateChanged {
        ip_address: String,
        state: PortScanJobState,
    },

    // ── Export ────────────────────────────────────────────────
    ExportStatusChanged { status: ExportStatus },

    // ── Sample data ───────────────────────────────────────────
    SampleDataLoaded { host_count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExportKind;

    #[test]
    fn event_serialization_roundtrip() {
        let event = CoordinatorEvent::new(EventPayload::TopologyUpdated {
            node_count: 4,
            edge_count: 3,
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: CoordinatorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
    }

    #[test]
    fn event_payload_tags() {
        let payload = EventPayload::ExportStatusChanged {
            status: ExportStatus::Running {
                kind: ExportKind::Csv,
            },
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"event_type\":\"ExportStatusChanged\""));
        assert!(json.contains("\"status\":\"running\""));
    }
}
