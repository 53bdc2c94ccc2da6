//! `endorsement` is the endorsement-gated ledger write protocol
//!
//! An author profile cannot write to the ledger by itself. Each of its writes becomes a
//! [`Transaction`] sent to the endorser connection resolved by [`discovery::EndorserDiscovery`].
//! The endorser counter-signs or refuses, the author submits the endorsed transaction to the
//! ledger and acknowledges the result back.
//!
//! - [`usecase::Usecase`] is the transaction manager, it implements [`types::TransactionAPI`]
//! - [`handler::Dispatcher`] is the inbound message boundary
pub mod discovery;
pub mod handler;
pub mod messages;
pub mod types;
pub mod usecase;

mod locks;
mod transaction;

#[cfg(test)]
pub(crate) mod fakes;

pub use discovery::{EndorsementDecision, EndorserDiscovery};
pub use handler::{Dispatcher, HandlerError};
pub use transaction::Transaction;
pub use usecase::Usecase;
