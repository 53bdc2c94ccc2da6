pub mod connection;
pub mod endorsement;
pub mod revocation;
pub mod shared;

mod manager;
pub use manager::Manager;
