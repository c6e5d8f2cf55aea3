//! # Outbound Events
//!
//! Handlers accumulate [`Event`]s in their [`Context`](crate::context::Context) and hand the
//! whole list to an [`EventPublisher`] once the operation finishes. Nothing is published
//! for an operation that was rolled back.
//!
//! [`SubscriptionHub`] is the in-process publisher: every event is fanned out to all
//! current subscribers over a `tokio::sync::broadcast` channel.

use crate::model::Component;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    ResourceAdded,
    ResourceUpdated,
    ResourceRemoved,
    Alert,
}

/// One outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_type: EventType,
    pub component: Component,
    pub uuid: String,
    /// External reference of the resource. `None` when it could no longer be resolved.
    pub origin: Option<String>,
}

/// Fan-out target for accumulated events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, events: Vec<Event>);
}

/// Broadcast-based publisher.
#[derive(Debug, Clone)]
pub struct SubscriptionHub {
    sender: broadcast::Sender<Event>,
}

impl SubscriptionHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for SubscriptionHub {
    fn publish(&self, events: Vec<Event>) {
        debug!(
            count = events.len(),
            subscribers = self.sender.receiver_count(),
            "Publishing events"
        );
        for event in events {
            // No subscribers is not an error.
            if self.sender.send(event).is_err() {
                trace!("No subscribers for event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(uuid: &str) -> Event {
        Event {
            event_type: EventType::ResourceAdded,
            component: Component::System,
            uuid: uuid.into(),
            origin: Some(format!("/redfish/v1/Systems/{uuid}")),
        }
    }

    #[tokio::test]
    async fn hub_delivers_to_every_subscriber() {
        let hub = SubscriptionHub::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.publish(vec![event("a"), event("b")]);

        assert_eq!(first.recv().await.unwrap().uuid, "a");
        assert_eq!(first.recv().await.unwrap().uuid, "b");
        assert_eq!(second.recv().await.unwrap().uuid, "a");
    }

    #[test]
    fn hub_without_subscribers_drops_events() {
        let hub = SubscriptionHub::new(8);
        hub.publish(vec![event("a")]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn event_serializes_camel_case() {
        let json = serde_json::to_value(event("a")).unwrap();
        assert_eq!(json["eventType"], "ResourceAdded");
        assert_eq!(json["origin"], "/redfish/v1/Systems/a");
    }
}
