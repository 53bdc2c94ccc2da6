//! `prople-scribe-core` holds the business logic of an identity agent that writes
//! transactions to a permissioned ledger through an endorser.
//!
//! Many agents hold no ledger write permission of their own. Such an agent, the **author**,
//! must ask a designated **endorser** agent to counter-sign every transaction before it can
//! be submitted to the ledger. This crate provides:
//!
//! - `profile`, the typed settings of the acting wallet profile (its role and endorser reference)
//! - `connection`, the contract of the connection registry used to reach peer agents
//! - `endorsement`, the endorsement sub-protocol: discovery, the transaction state machine,
//!   the transaction manager and the inbound message handlers
//! - `events`, an explicit publish/subscribe registry with typed topics
//! - `revocation`, the revocation event emitters and the listener that turns a write-intent
//!   into an endorsement transaction
//!
//! All infrastructure (storage, transport, ledger, signing) is consumed through traits, the
//! concrete implementations live in `prople-scribe-rpc`.
pub mod connection;
pub mod endorsement;
pub mod events;
pub mod profile;
pub mod revocation;
