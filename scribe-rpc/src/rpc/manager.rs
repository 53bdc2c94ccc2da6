use std::sync::Arc;

use log::info;

use prople_scribe_core::endorsement::{EndorserDiscovery, Usecase};
use prople_scribe_core::events::{EventBus, Notifier};
use prople_scribe_core::revocation::{EndorsementListener, RevocationEmitter, WRITE_CATEGORIES};

use crate::apps::db::Builder as DbBuilder;
use crate::apps::{
    ConnectionRepository, IssuerCredRevRepository, KeySigner, LedgerClient, TransactionRepository,
};
use crate::common::types::CommonError;
use crate::config::Config;

use super::connection::ConnectionHandler;
use super::endorsement::{EndorsementHandler, RpcClient};
use super::revocation::RevocationHandler;
use super::shared::processor::RpcProcessor;
use super::shared::types::RPCService;

/// `Manager` wires the adapters into the domain services and registers their routes
pub struct Manager {
    processor: RpcProcessor,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        let processor = RpcProcessor::default();
        Self { processor }
    }

    pub async fn build_scribe_service(&mut self, conf: Config) -> Result<&mut Self, CommonError> {
        let mut db_builder = DbBuilder::new(conf.clone());
        let db_executor = db_builder.build(|opts| {
            let opts_db = opts.db();
            (opts_db.get_common(), opts_db.get_db_options())
        })?;

        let profile = conf.profile().build()?;
        let signer = KeySigner::from_seed(conf.signer().get_seed())?;
        let ledger = LedgerClient::new(conf.ledger().get_endpoint());

        let transactions = TransactionRepository::new(db_executor.clone());
        let connections = ConnectionRepository::new(db_executor.clone());
        let issuer_records = IssuerCredRevRepository::new(db_executor);

        let bus = EventBus::new();
        let manager = Usecase::new(
            profile.clone(),
            transactions,
            connections.clone(),
            RpcClient::new(),
            ledger.clone(),
            signer,
        )
        .with_notifier(Notifier::new(bus.clone()));

        let listener = EndorsementListener::new(profile.get_name(), manager.clone(), ledger)
            .with_notifier(Notifier::new(bus.clone()));
        bus.subscribe(WRITE_CATEGORIES.to_vec(), Arc::new(listener))
            .await
            .map_err(|err| CommonError::InternalError(err.to_string()))?;

        let emitter = RevocationEmitter::new(
            EndorserDiscovery::new(connections.clone()),
            Notifier::new(bus),
            issuer_records,
        );

        let services: Vec<(&str, Box<dyn RPCService>)> = vec![
            (
                "endorsement",
                Box::new(EndorsementHandler::new(manager, connections.clone())),
            ),
            ("connection", Box::new(ConnectionHandler::new(connections))),
            (
                "revocation",
                Box::new(RevocationHandler::new(profile.clone(), emitter)),
            ),
        ];

        for (name, service) in services {
            let routes = service.routes();
            if routes.is_empty() {
                return Err(CommonError::RpcError(format!(
                    "{} doesn't have any routes",
                    name
                )));
            }

            for route in routes {
                self.processor.register_route(route);
            }
        }

        info!(
            "[manager] profile: {} role: {:?} routes: {}",
            profile.get_name(),
            profile.get_role(),
            self.processor.routes_len()
        );

        Ok(self)
    }

    pub fn processor(&self) -> RpcProcessor {
        self.processor.clone()
    }
}
