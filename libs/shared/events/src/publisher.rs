use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::event::TransitionEvent;

/// Sink for committed transitions. Publishing happens after the state change
/// is persisted and must not fail it; implementations handle and log their
/// own delivery problems.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: TransitionEvent);
}

/// In-process fan-out over a tokio broadcast channel. Callers that want a
/// live feed subscribe through `subscribe`; a feed with no subscribers drops
/// events silently.
pub struct BroadcastPublisher {
    sender: broadcast::Sender<TransitionEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastPublisher {
    async fn publish(&self, event: TransitionEvent) {
        debug!("Broadcasting {} event", event.name());
        // send only errors when nobody is subscribed, which is a valid state
        let _ = self.sender.send(event);
    }
}

/// Delivers events to the notification collaborator over HTTP.
pub struct WebhookPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookPublisher {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl EventPublisher for WebhookPublisher {
    async fn publish(&self, event: TransitionEvent) {
        let name = event.name();
        match self.client.post(&self.endpoint).json(&event).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Delivered {} event to {}", name, self.endpoint);
            }
            Ok(response) => {
                warn!(
                    "Event webhook returned {} for {} event",
                    response.status(),
                    name
                );
            }
            Err(e) => {
                warn!("Failed to deliver {} event: {}", name, e);
            }
        }
    }
}

/// Publishes each event to every configured sink concurrently.
pub struct FanoutPublisher {
    sinks: Vec<Arc<dyn EventPublisher>>,
}

impl FanoutPublisher {
    pub fn new(sinks: Vec<Arc<dyn EventPublisher>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(&self, event: TransitionEvent) {
        join_all(self.sinks.iter().map(|sink| sink.publish(event.clone()))).await;
    }
}
