use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::RwLock;

use super::types::{Event, EventCategory, EventError, Listener};

type Registry = HashMap<EventCategory, Vec<Arc<dyn Listener>>>;

/// `EventBus` is the process-wide subscription registry
///
/// Producers publish without knowing which listeners exist. Delivery is sequential, in
/// subscription order, and awaited by the publisher. A failing listener is logged and does not
/// stop delivery to the others.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Registry>>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(
        &self,
        categories: Vec<EventCategory>,
        listener: Arc<dyn Listener>,
    ) -> Result<(), EventError> {
        if self.is_closed() {
            return Err(EventError::BusClosed);
        }

        let mut listeners = self.listeners.write().await;
        for category in categories {
            listeners
                .entry(category)
                .or_default()
                .push(listener.clone());
        }

        Ok(())
    }

    /// `publish` delivers the event and returns how many listeners received it
    pub async fn publish(&self, event: Event) -> Result<usize, EventError> {
        if self.is_closed() {
            return Err(EventError::BusClosed);
        }

        let targets = {
            let listeners = self.listeners.read().await;
            listeners
                .get(&event.category())
                .cloned()
                .unwrap_or_default()
        };

        debug!(
            "[events:publish] topic: {} listeners: {}",
            event.topic,
            targets.len()
        );

        for listener in targets.iter() {
            if let Err(err) = listener.on_event(event.clone()).await {
                warn!("[events:publish] topic: {} listener failed: {}", event.topic, err);
            }
        }

        Ok(targets.len())
    }

    /// `close` makes the bus unavailable, any later publish or subscribe fails
    pub async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.listeners.write().await.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
