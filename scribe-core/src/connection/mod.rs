//! `connection` is the registry of established DIDComm-style channels to peer agents.
//!
//! Connection establishment itself (the DID exchange) is handled outside of this crate. The
//! endorsement protocol only needs to know whether a connection is ready, who is on the other
//! side of it and which job the counterparty plays (author or endorser).
pub mod types;

mod connection;
pub use connection::Connection;
