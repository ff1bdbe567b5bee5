//! Typed event bus between the map pipeline and surrounding UI panels.
//!
//! A broadcast channel carrying tagged payloads. Publishing never blocks
//! and never fails: events sent while nobody is subscribed are dropped,
//! which is exactly the fire-and-forget contract the panels rely on.

use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{ConceptId, InstanceId};

/// Events published by the registries, the scene, and the graph view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// The concept registry finished its bulk load.
    ConceptsReady,
    /// The instance registry finished its bulk load.
    InstancesReady,
    /// A tile was clicked; carries the bucket of instance ids at that cell.
    TileSelected {
        x: u32,
        y: u32,
        instances: Vec<InstanceId>,
    },
    /// The graph view's current node changed.
    NodeSelected(ConceptId),
    /// The graph view's current edge changed.
    EdgeSelected { source: ConceptId, target: ConceptId },
    /// The graph view's selection was cleared.
    SelectionCleared,
}

/// Shared publish/subscribe handle.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorldEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        // 64 is plenty: the pipeline emits a handful of events per user
        // interaction and subscribers drain on every frame.
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to every current subscriber.
    pub fn publish(&self, event: WorldEvent) {
        debug!(?event, "publish");
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(event);
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
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(WorldEvent::ConceptsReady);
        bus.publish(WorldEvent::TileSelected {
            x: 1,
            y: 2,
            instances: vec![InstanceId(10)],
        });

        assert_eq!(rx.recv().await.unwrap(), WorldEvent::ConceptsReady);
        assert_eq!(
            rx.recv().await.unwrap(),
            WorldEvent::TileSelected {
                x: 1,
                y: 2,
                instances: vec![InstanceId(10)],
            }
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_fire_and_forget() {
        let bus = EventBus::new();
        // Must not panic or error.
        bus.publish(WorldEvent::InstancesReady);
    }
}
