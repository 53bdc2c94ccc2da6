use log::debug;
use serde_json::Value;

use crate::profile::Profile;

use super::bus::EventBus;
use super::types::{Event, EventError, Topic};

/// `Notifier` publishes write-intent notifications on behalf of a profile
///
/// It does not compute endorsement decisions itself, producers attach the decision to the
/// metadata before calling [`Notifier::notify`].
#[derive(Clone)]
pub struct Notifier {
    bus: EventBus,
}

impl Notifier {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// `notify` fails only when the bus is unavailable
    pub async fn notify(
        &self,
        profile: &Profile,
        topic: Topic,
        metadata: Value,
    ) -> Result<(), EventError> {
        debug!(
            "[events:notify] profile: {} topic: {}",
            profile.get_name(),
            topic
        );

        let event = Event {
            profile: profile.get_name(),
            topic,
            payload: metadata,
        };

        self.bus.publish(event).await.map(|_| ())
    }

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }
}
