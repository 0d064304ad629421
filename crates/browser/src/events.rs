//! Event Bus - reader lifecycle notifications
//!
//! Design: plain enum events over a tokio broadcast channel.
//! Publishing never blocks and never fails for lack of listeners.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Reader events published by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReaderEvent {
    /// A tab was attached and is ready for activation
    TabAttached { target_id: String },
    /// An overlay was built and shown
    Activated {
        target_id: String,
        activation_id: Uuid,
        title: String,
        body_nodes: usize,
    },
    /// Activation was a no-op because an overlay is already shown
    Skipped { target_id: String },
    /// The overlay was removed and page scrolling restored
    Dismissed { target_id: String },
    /// Activation or dismissal failed at the host boundary
    Failed { target_id: String, error: String },
}

impl ReaderEvent {
    pub fn target_id(&self) -> &str {
        match self {
            ReaderEvent::TabAttached { target_id }
            | ReaderEvent::Activated { target_id, .. }
            | ReaderEvent::Skipped { target_id }
            | ReaderEvent::Dismissed { target_id }
            | ReaderEvent::Failed { target_id, .. } => target_id,
        }
    }
}

/// Simple event bus using tokio broadcast channel
pub struct EventBus {
    tx: broadcast::Sender<ReaderEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: ReaderEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(ReaderEvent::Skipped {
            target_id: "T1".to_string(),
        });

        match rx.recv().await {
            Ok(event) => assert_eq!(event.target_id(), "T1"),
            Err(e) => panic!("Expected Skipped event, got {e}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.publish(ReaderEvent::Dismissed {
            target_id: "T1".to_string(),
        });
    }
}
