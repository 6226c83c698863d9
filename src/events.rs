// Copyright 2026 NANDO Registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! Registry event bus: typed events from the discovery pipeline.
//!
//! The EventBus is a `tokio::sync::broadcast` channel carrying
//! [`DiscoveryEvent`] values. Consumers (the REST SSE endpoint, the sweep
//! progress bar) subscribe independently. When no subscribers exist,
//! events are silently dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event a discovery run emits. Serialized to JSON for SSE.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiscoveryEvent {
    // ── Run Events ────────────────────────
    /// A discovery run has started for one disease.
    RunStarted {
        run_id: String,
        disease_id: i64,
        disease_name: String,
    },
    /// Search terms were generated (after caps).
    TermsGenerated { run_id: String, count: usize },
    /// One search query was issued and answered.
    SearchIssued {
        run_id: String,
        term: String,
        results: usize,
    },
    /// A result page was fetched and reduced to text.
    PageFetched {
        run_id: String,
        url: String,
        chars: usize,
    },
    /// Extraction finished for one page.
    Extracted {
        run_id: String,
        url: String,
        candidates: usize,
        accepted: usize,
    },
    /// A single result was skipped (fetch or extraction failure).
    ResultSkipped {
        run_id: String,
        url: String,
        reason: String,
    },
    /// The run persisted its batch and finished.
    RunCompleted {
        run_id: String,
        disease_id: i64,
        organizations: usize,
        elapsed_ms: u64,
    },
    /// The run aborted before persisting anything.
    RunFailed { run_id: String, error: String },

    // ── Sweep Events ──────────────────────
    /// Bulk discovery progress across searchable diseases.
    SweepProgress {
        completed: usize,
        total: usize,
        current: String,
    },
}

/// The central event bus.
///
/// Pipeline tasks emit events through this bus; consumers subscribe to
/// receive a stream of all events.
pub struct EventBus {
    sender: broadcast::Sender<DiscoveryEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: DiscoveryEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.sender.subscribe()
    }
}

/// Check if an event belongs to a specific run.
pub fn event_matches_run(event: &DiscoveryEvent, run_id: &str) -> bool {
    match event {
        DiscoveryEvent::RunStarted { run_id: r, .. }
        | DiscoveryEvent::TermsGenerated { run_id: r, .. }
        | DiscoveryEvent::SearchIssued { run_id: r, .. }
        | DiscoveryEvent::PageFetched { run_id: r, .. }
        | DiscoveryEvent::Extracted { run_id: r, .. }
        | DiscoveryEvent::ResultSkipped { run_id: r, .. }
        | DiscoveryEvent::RunCompleted { run_id: r, .. }
        | DiscoveryEvent::RunFailed { run_id: r, .. } => r == run_id,
        // Sweep events are not run-specific, every subscriber sees them
        DiscoveryEvent::SweepProgress { .. } => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DiscoveryEvent::RunStarted {
            run_id: "a1b2".to_string(),
            disease_id: 42,
            disease_name: "ファブリー病".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("RunStarted"));
        assert!(json.contains("ファブリー病"));

        // Roundtrip
        let parsed: DiscoveryEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            DiscoveryEvent::RunStarted { disease_id, .. } => assert_eq!(disease_id, 42),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_event_bus_emit_no_subscribers() {
        let bus = EventBus::new(16);
        // Should not panic when no subscribers
        bus.emit(DiscoveryEvent::SweepProgress {
            completed: 0,
            total: 10,
            current: "筋萎縮性側索硬化症".to_string(),
        });
    }

    #[test]
    fn test_event_bus_subscribe_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(DiscoveryEvent::TermsGenerated {
            run_id: "r1".to_string(),
            count: 6,
        });

        let event = rx.try_recv().unwrap();
        match event {
            DiscoveryEvent::TermsGenerated { count, .. } => assert_eq!(count, 6),
            _ => panic!("wrong event"),
        }
    }

    #[test]
    fn test_event_matches_run() {
        let event = DiscoveryEvent::PageFetched {
            run_id: "r1".to_string(),
            url: "https://example.org".to_string(),
            chars: 5000,
        };
        assert!(event_matches_run(&event, "r1"));
        assert!(!event_matches_run(&event, "r2"));

        // Sweep events always match
        let sweep = DiscoveryEvent::SweepProgress {
            completed: 1,
            total: 2,
            current: "次の疾患".to_string(),
        };
        assert!(event_matches_run(&sweep, "anything"));
    }
}
