use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use serde::Serialize;
use serde_json::Value;

use prople_scribe_core::connection::types::{ConnectionEntityAccessor, ConnectionRegistry};
use prople_scribe_core::endorsement::types::{EndorsementError, TransactionAPI};
use prople_scribe_core::endorsement::Dispatcher;

use crate::rpc::shared::method::build_rpc_method;
use crate::rpc::shared::types::{
    RPCService, RpcError, RpcHandler, RpcHandlerOutput, RpcMethod, RpcRoute,
};

use super::rpc_method::Method;
use super::rpc_param::{Agent, Domain, Param};

fn handler_error(err: EndorsementError) -> RpcError {
    RpcError::HandlerError(err.to_string())
}

fn to_output(value: impl Serialize) -> RpcHandlerOutput {
    let output = serde_json::to_value(value).map_err(|_| RpcError::InternalError)?;
    Ok(Some(output))
}

/// `EndorsementHandler` serves the endorsement protocol over JSON-RPC
///
/// Peer agents deliver protocol messages through [`Agent::ReceiveMessage`]. The sender is resolved
/// to the local connection whose counterparty DID matches, then the message goes through the
/// [`Dispatcher`]. Operator calls go to the transaction manager directly.
#[derive(Clone)]
pub struct EndorsementHandler<TTransactionAPI, TRegistry>
where
    TTransactionAPI: TransactionAPI,
    TRegistry: ConnectionRegistry,
{
    manager: TTransactionAPI,
    registry: TRegistry,
    dispatcher: Dispatcher<TRegistry, TTransactionAPI>,
}

impl<TTransactionAPI, TRegistry> EndorsementHandler<TTransactionAPI, TRegistry>
where
    TTransactionAPI: TransactionAPI,
    TRegistry: ConnectionRegistry,
{
    pub fn new(manager: TTransactionAPI, registry: TRegistry) -> Self {
        let dispatcher = Dispatcher::new(registry.clone(), manager.clone());
        Self {
            manager,
            registry,
            dispatcher,
        }
    }

    async fn receive_message(&self, param: Param) -> RpcHandlerOutput {
        let Param::Agent(Agent::ReceiveMessage {
            sender_did,
            message,
        }) = param
        else {
            return Err(RpcError::InvalidParams);
        };

        let connection = self
            .registry
            .find_by_their_did(sender_did.to_owned())
            .await
            .map_err(|err| {
                warn!(
                    "[rpc:endorsement] message from unknown sender: {} error: {}",
                    sender_did, err
                );
                RpcError::HandlerError(err.to_string())
            })?;

        self.dispatcher
            .dispatch(connection.get_id(), message)
            .await
            .map_err(|err| RpcError::HandlerError(err.to_string()))?;

        Ok(None)
    }

    async fn operate(&self, method: Method, param: Param) -> RpcHandlerOutput {
        let Param::Domain(domain) = param else {
            return Err(RpcError::InvalidParams);
        };

        match (method, domain) {
            (Method::Endorse, Domain::Endorse { transaction_id }) => {
                to_output(self.manager.endorse(transaction_id).await.map_err(handler_error)?)
            }
            (
                Method::Refuse,
                Domain::Refuse {
                    transaction_id,
                    reason,
                },
            ) => to_output(
                self.manager
                    .refuse(transaction_id, reason)
                    .await
                    .map_err(handler_error)?,
            ),
            (Method::Resend, Domain::Resend { transaction_id }) => {
                to_output(self.manager.resend(transaction_id).await.map_err(handler_error)?)
            }
            (Method::RequestResend, Domain::RequestResend { transaction_id }) => to_output(
                self.manager
                    .request_resend(transaction_id)
                    .await
                    .map_err(handler_error)?,
            ),
            (Method::Cancel, Domain::Cancel { transaction_id }) => {
                to_output(self.manager.cancel(transaction_id).await.map_err(handler_error)?)
            }
            (Method::GetTransaction, Domain::GetTransaction { transaction_id }) => to_output(
                self.manager
                    .get_transaction(transaction_id)
                    .await
                    .map_err(handler_error)?,
            ),
            (Method::ListTransactions, Domain::ListTransactions { state }) => to_output(
                self.manager
                    .list_transactions(state)
                    .await
                    .map_err(handler_error)?,
            ),
            _ => Err(RpcError::InvalidParams),
        }
    }
}

#[async_trait]
impl<TTransactionAPI, TRegistry> RpcHandler for EndorsementHandler<TTransactionAPI, TRegistry>
where
    TTransactionAPI: TransactionAPI + 'static,
    TRegistry: ConnectionRegistry + 'static,
{
    async fn call(&self, method: RpcMethod, params: Option<Value>) -> RpcHandlerOutput {
        let param_value = params.ok_or(RpcError::InvalidParams)?;
        let rpc_param = Param::try_from(param_value).map_err(|_| RpcError::ParseError)?;
        let rpc_method = Method::try_from(method).map_err(|_| RpcError::MethodNotFound)?;

        match rpc_method {
            Method::ReceiveMessage => self.receive_message(rpc_param).await,
            method => self.operate(method, rpc_param).await,
        }
    }
}

impl<TTransactionAPI, TRegistry> RPCService for EndorsementHandler<TTransactionAPI, TRegistry>
where
    TTransactionAPI: TransactionAPI + 'static,
    TRegistry: ConnectionRegistry + 'static,
{
    fn routes(&self) -> Vec<RpcRoute> {
        let handler: Arc<dyn RpcHandler> = Arc::new(self.clone());
        Method::all()
            .into_iter()
            .map(|method| RpcRoute::new(build_rpc_method(method), handler.clone()))
            .collect()
    }
}
