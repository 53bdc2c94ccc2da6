use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const EVENT_PREFIX: &str = "scribe::";

/// `EventError` is a base error types for the `events` domain
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
pub enum EventError {
    #[error("event bus closed")]
    BusClosed,

    #[error("listener error: {0}")]
    ListenerError(String),

    #[error("json error: {0}")]
    JSONError(String),
}

/// `EventCategory` enumerates every topic family published on the bus
///
/// Listeners subscribe to categories, never to raw topic strings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EventCategory {
    #[display("REVOCATION::REGISTRY")]
    RevocationRegistry,

    #[display("REVOCATION::ENTRY")]
    RevocationEntry,

    #[display("REVOCATION::TAILS")]
    RevocationTails,

    #[display("REVOCATION::issuer::revoke")]
    IssuerRevoke,

    #[display("ENDORSE_TRANSACTION::outcome")]
    TransactionOutcome,
}

/// `Topic` is an event category plus the key identifying the subject of the event
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub category: EventCategory,
    pub key: String,
}

impl Topic {
    pub fn new(category: EventCategory, key: impl Into<String>) -> Self {
        Self {
            category,
            key: key.into(),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}::{}", EVENT_PREFIX, self.category, self.key)
    }
}

/// `Event` is a published notification, scoped to the profile that produced it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Event {
    pub profile: String,
    pub topic: Topic,
    pub payload: Value,
}

impl Event {
    pub fn category(&self) -> EventCategory {
        self.topic.category
    }
}

/// `Listener` receives the events of the categories it subscribed to
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_event(&self, event: Event) -> Result<(), EventError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        let table = vec![
            (
                Topic::new(EventCategory::RevocationRegistry, "CD1"),
                "scribe::REVOCATION::REGISTRY::CD1",
            ),
            (
                Topic::new(EventCategory::RevocationEntry, "RR1"),
                "scribe::REVOCATION::ENTRY::RR1",
            ),
            (
                Topic::new(EventCategory::RevocationTails, "RR1"),
                "scribe::REVOCATION::TAILS::RR1",
            ),
            (
                Topic::new(EventCategory::IssuerRevoke, "7"),
                "scribe::REVOCATION::issuer::revoke::7",
            ),
            (
                Topic::new(EventCategory::TransactionOutcome, "tx-1"),
                "scribe::ENDORSE_TRANSACTION::outcome::tx-1",
            ),
        ];

        for (topic, expected) in table {
            assert_eq!(topic.to_string(), expected)
        }
    }
}
