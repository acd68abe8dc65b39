use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::live::ClientEvent;

const EVENT_BROADCAST_CAPACITY: usize = 256;

/// Fan-out point for client events. Clients own one and hand out
/// subscriptions from it.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ClientEvent>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BROADCAST_CAPACITY);
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn subscribe(&self) -> EventSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            subscription = id,
            subscribers = self.tx.receiver_count() + 1,
            "Subscriber attached"
        );
        EventSubscription {
            id,
            rx: self.tx.subscribe(),
        }
    }

    /// Delivers `event` to every live subscription. Returns the number of
    /// subscribers reached.
    pub fn emit(&self, event: ClientEvent) -> usize {
        let name = event.name();
        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => {
                tracing::debug!(event = name, "Event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Scoped subscription to client events. Dropping it unsubscribes.
pub struct EventSubscription {
    id: u64,
    rx: broadcast::Receiver<ClientEvent>,
}

impl EventSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ClientEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        subscription = self.id,
                        lagged = n,
                        "Event subscriber lagged, some events were dropped"
                    );
                }
            }
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        tracing::debug!(subscription = self.id, "Subscriber released");
    }
}
