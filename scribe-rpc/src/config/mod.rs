mod app;
pub use app::App;

mod database;
pub use database::{Database, RocksDBCommon, RocksDBOptions};

mod ledger;
pub use ledger::Ledger;

mod profile;
pub use profile::Profile;

mod signer;
pub use signer::Signer;

#[allow(clippy::module_inception)]
mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
