pub mod db;

mod connection;
mod endorsement;
mod ledger;
mod revocation;
mod signer;

pub use connection::ConnectionRepository;
pub use endorsement::TransactionRepository;
pub use ledger::LedgerClient;
pub use revocation::IssuerCredRevRepository;
pub use signer::KeySigner;
