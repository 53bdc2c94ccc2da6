//! `events` provides the typed publish/subscribe mechanism used to route write intents
//!
//! Topics are typed ([`types::EventCategory`] plus a key) so producers and listeners agree on
//! their contracts at compile time.
pub mod types;

mod bus;
mod notifier;

pub use bus::EventBus;
pub use notifier::Notifier;
