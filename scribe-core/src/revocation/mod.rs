//! `revocation` hosts the producers of revocation write intents and their endorsement listener
pub mod types;

mod emitter;
mod listener;

pub use emitter::RevocationEmitter;
pub use listener::{EndorsementListener, WRITE_CATEGORIES};
