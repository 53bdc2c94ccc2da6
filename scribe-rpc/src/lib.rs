//! `prople-scribe-rpc` binds the endorsement domain of `prople-scribe-core` to its infrastructure
//!
//! - `apps`, the RocksDB stores, the ledger gateway client and the ed25519 signer
//! - `config`, the TOML configuration of one agent
//! - `rpc`, the JSON-RPC processor, its handlers and the outbound agent client
//!
//! [`ScribeRPC`] is the entry point used by the daemon.
pub mod apps;
pub mod common;
pub mod config;
pub mod rpc;

use common::helpers::validate;
use common::types::CommonError;
use config::{App, Config, Parser as ConfigParser};
use rpc::shared::processor::RpcProcessor;
use rpc::Manager;

/// `ScribeRPC` loads a validated configuration and builds the services out of it
pub struct ScribeRPC {
    config: Config,
}

impl ScribeRPC {
    pub fn new(conf_file: &str) -> Result<Self, CommonError> {
        let config = ConfigParser::new(conf_file.to_string()).parse()?;
        validate(config.clone())?;

        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Result<Self, CommonError> {
        validate(config.clone())?;
        Ok(Self { config })
    }

    pub fn build_app_config(&self) -> App {
        self.config.app().to_owned()
    }

    pub async fn build_rpc_processor(&self) -> Result<RpcProcessor, CommonError> {
        let mut manager = Manager::new();
        manager.build_scribe_service(self.config.clone()).await?;

        Ok(manager.processor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers::testdb;

    #[test]
    fn test_new_from_file() {
        let scribe = ScribeRPC::new(&testdb::fixture("config.toml")).unwrap();
        let (host, port) = scribe.build_app_config().get_app_config();

        assert_eq!(host, "localhost");
        assert_eq!(port, "8181");
    }

    #[test]
    fn test_new_missing_file() {
        let result = ScribeRPC::new(&testdb::fixture("missing.toml"));
        assert!(matches!(result, Err(CommonError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_build_rpc_processor() {
        let (_dir, config) = testdb::temp_config();
        let scribe = ScribeRPC::from_config(config).unwrap();

        let processor = scribe.build_rpc_processor().await.unwrap();
        assert!(processor.routes_len() > 0);
    }
}
