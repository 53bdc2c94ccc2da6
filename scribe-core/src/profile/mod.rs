//! `profile` is the acting wallet profile. Every ledger write intent and every
//! endorsement transaction is owned by exactly one profile.
//!
//! The profile settings are resolved once, when the [`Profile`] is constructed, into a typed
//! [`types::ProfileSettings`] so the endorsement logic never has to parse a generic settings map.
pub mod types;

mod profile;
pub use profile::Profile;
