use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connection::types::{ConnectionError, ConnectionRegistry, Readiness};

use super::messages::{
    Message, TransactionAcknowledgement, TransactionCancel, TransactionRequest,
    TransactionResend, TransactionResponse,
};
use super::types::{EndorsementError, TransactionAPI};

/// `HandlerError` is raised when an inbound message fails the dispatch precondition
///
/// It never carries a manager failure, those are absorbed by the [`Dispatcher`].
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
pub enum HandlerError {
    #[error("connection not ready: {0}")]
    UnreadyConnection(String),

    #[error("unknown connection: {0}")]
    UnknownConnection(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}

/// `Dispatcher` routes inbound endorsement messages to the transaction manager
///
/// Every handler first checks the connection the message arrived on is ready. When it is not,
/// the handler fails with a [`HandlerError`] before touching any record. Manager failures are
/// logged and dropped the same way for every message kind, no reply is ever sent for them.
#[derive(Clone)]
pub struct Dispatcher<TRegistry, TTransactionAPI>
where
    TRegistry: ConnectionRegistry,
    TTransactionAPI: TransactionAPI,
{
    registry: TRegistry,
    manager: TTransactionAPI,
}

impl<TRegistry, TTransactionAPI> Dispatcher<TRegistry, TTransactionAPI>
where
    TRegistry: ConnectionRegistry,
    TTransactionAPI: TransactionAPI,
{
    pub fn new(registry: TRegistry, manager: TTransactionAPI) -> Self {
        Self { registry, manager }
    }

    pub async fn dispatch(&self, connection_id: String, message: Message) -> Result<(), HandlerError> {
        debug!(
            "[endorsement:dispatch] kind: {} transaction: {} connection: {}",
            message.kind(),
            message.transaction_id(),
            connection_id
        );

        match message {
            Message::TransactionRequest(msg) => self.handle_request(connection_id, msg).await,
            Message::TransactionResponse(msg) => self.handle_response(connection_id, msg).await,
            Message::TransactionResend(msg) => self.handle_resend(connection_id, msg).await,
            Message::TransactionAcknowledgement(msg) => {
                self.handle_acknowledgement(connection_id, msg).await
            }
            Message::TransactionCancel(msg) => self.handle_cancel(connection_id, msg).await,
        }
    }

    pub async fn handle_request(
        &self,
        connection_id: String,
        msg: TransactionRequest,
    ) -> Result<(), HandlerError> {
        self.ensure_ready(&connection_id).await?;

        let transaction_id = msg.transaction_id.to_owned();
        let result = self.manager.receive_request(connection_id, msg).await;
        absorb("transaction-request", &transaction_id, result);
        Ok(())
    }

    pub async fn handle_response(
        &self,
        connection_id: String,
        msg: TransactionResponse,
    ) -> Result<(), HandlerError> {
        self.ensure_ready(&connection_id).await?;

        let transaction_id = msg.transaction_id.to_owned();
        let result = self.manager.receive_response(connection_id, msg).await;
        absorb("transaction-response", &transaction_id, result);
        Ok(())
    }

    pub async fn handle_resend(
        &self,
        connection_id: String,
        msg: TransactionResend,
    ) -> Result<(), HandlerError> {
        self.ensure_ready(&connection_id).await?;

        let transaction_id = msg.transaction_id.to_owned();
        let result = self
            .manager
            .receive_transaction_resend(connection_id, msg)
            .await;
        absorb("transaction-resend", &transaction_id, result);
        Ok(())
    }

    pub async fn handle_acknowledgement(
        &self,
        connection_id: String,
        msg: TransactionAcknowledgement,
    ) -> Result<(), HandlerError> {
        self.ensure_ready(&connection_id).await?;

        let transaction_id = msg.transaction_id.to_owned();
        let result = self
            .manager
            .receive_acknowledgement(connection_id, msg)
            .await;
        absorb("transaction-acknowledgement", &transaction_id, result);
        Ok(())
    }

    pub async fn handle_cancel(
        &self,
        connection_id: String,
        msg: TransactionCancel,
    ) -> Result<(), HandlerError> {
        self.ensure_ready(&connection_id).await?;

        let transaction_id = msg.transaction_id.to_owned();
        let result = self.manager.receive_cancel(connection_id, msg).await;
        absorb("transaction-cancel", &transaction_id, result);
        Ok(())
    }

    async fn ensure_ready(&self, connection_id: &str) -> Result<(), HandlerError> {
        let readiness = self
            .registry
            .check_readiness(connection_id.to_string())
            .await
            .map_err(|err| match err {
                ConnectionError::ConnectionNotFound(msg) => HandlerError::UnknownConnection(msg),
                _ => HandlerError::ConnectionError(err.to_string()),
            })?;

        match readiness {
            Readiness::Ready(_) => Ok(()),
            Readiness::NotReady(_) => {
                warn!(
                    "[endorsement:dispatch] protocol violation, connection not ready: {}",
                    connection_id
                );
                Err(HandlerError::UnreadyConnection(connection_id.to_string()))
            }
        }
    }
}

fn absorb<T>(kind: &str, transaction_id: &str, result: Result<T, EndorsementError>) {
    if let Err(err) = result {
        warn!(
            "[endorsement:dispatch] kind: {} transaction: {} dropped: {}",
            kind, transaction_id, err
        );
    }
}
