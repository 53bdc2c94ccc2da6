use async_trait::async_trait;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::connection::Connection;

use super::messages::{
    Message, TransactionAcknowledgement, TransactionCancel, TransactionRequest,
    TransactionResend, TransactionResponse,
};
use super::Transaction;

/// Placeholder used for the connection id of the record owner's own side
pub const SELF_CONNECTION: &str = "self";

/// `EndorsementError` is a base error types for the `endorsement` domain
///
/// The first five variants are the typed failures callers of the protocol entrypoints should
/// expect. A refused endorsement is never an error, it's reported through [`ResponseOutcome`] and
/// [`TransactionOutcome`].
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
pub enum EndorsementError {
    #[error("endorser connection not found: {0}")]
    EndorserConnectionNotFound(String),

    #[error("unready connection: {0}")]
    UnreadyConnection(String),

    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("terminal transaction: {0}")]
    TerminalTransaction(String),

    #[error("ledger submit failed: {0}")]
    LedgerSubmitFailed(String),

    #[error("unauthorized connection: {0}")]
    UnauthorizedConnection(String),

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("signature error: {0}")]
    SignatureError(String),

    #[error("repo error: {0}")]
    RepoError(String),

    #[error("send error: {0}")]
    SendError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("event error: {0}")]
    EventError(String),
}

/// Unique identifier of an endorsement transaction, shared by both parties
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
pub struct TransactionID(String);

impl TransactionID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `State` is the endorsement transaction state machine
///
/// ```text
/// init -> request_sent (author) | request_received (endorser)
///      -> endorsed | refused | cancelled
///      -> write_acked | write_failed
/// ```
///
/// [`State::Refused`], [`State::WriteAcked`], [`State::WriteFailed`] and [`State::Cancelled`]
/// are terminal, no transition leaves them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[display("init")]
    Init,

    #[display("request_sent")]
    RequestSent,

    #[display("request_received")]
    RequestReceived,

    #[display("endorsed")]
    Endorsed,

    #[display("refused")]
    Refused,

    #[display("write_acked")]
    WriteAcked,

    #[display("write_failed")]
    WriteFailed,

    #[display("cancelled")]
    Cancelled,
}

impl State {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Refused | State::WriteAcked | State::WriteFailed | State::Cancelled
        )
    }
}

/// `Side` tells which party of the protocol owns a transaction record
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Author,
    Endorser,
}

/// `SignatureResponse` is the signature metadata produced by an endorser
///
/// The `signature` is a base64 encoded signature over the transaction payload, `verification_key`
/// is the signer's base64 encoded public key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignatureResponse {
    pub signer: String,
    pub signature: String,
    pub verification_key: String,
}

/// `Attachment` is one signable payload in a transaction's `messages_attach` sequence
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureResponse>,
}

impl Attachment {
    pub fn new(payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            signature: None,
        }
    }

    pub fn signed(payload: Value, signature: SignatureResponse) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            signature: Some(signature),
        }
    }
}

/// `ResponseOutcome` is the substantive result of applying a `transaction-response`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Endorsed,
    Refused { reason: String },
}

/// `TransactionOutcome` is the terminal result of an author transaction
///
/// It's returned from [`TransactionAPI::receive_response`] and published as an outcome event so
/// the write-intent producer learns about the result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    WriteAcked {
        transaction_id: String,
        ledger_sequence_no: u64,
    },
    WriteFailed {
        transaction_id: String,
        reason: String,
    },
    Refused {
        transaction_id: String,
        reason: String,
    },
    Cancelled {
        transaction_id: String,
    },
}

impl TransactionOutcome {
    pub fn transaction_id(&self) -> String {
        match self {
            TransactionOutcome::WriteAcked { transaction_id, .. }
            | TransactionOutcome::WriteFailed { transaction_id, .. }
            | TransactionOutcome::Refused { transaction_id, .. }
            | TransactionOutcome::Cancelled { transaction_id } => transaction_id.to_owned(),
        }
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, TransactionOutcome::Refused { .. })
    }
}

/// `RepoBuilder` is the transaction record store abstraction
///
/// Every record is scoped to its owning profile name. A missing record is not an error, `get`
/// returns `None` and the caller decides.
#[async_trait]
pub trait RepoBuilder: Clone + Sync + Send {
    async fn get(
        &self,
        profile: String,
        transaction_id: String,
    ) -> Result<Option<Transaction>, EndorsementError>;

    async fn put(&self, profile: String, transaction: &Transaction)
        -> Result<(), EndorsementError>;

    async fn delete(&self, profile: String, transaction_id: String)
        -> Result<(), EndorsementError>;

    async fn list(
        &self,
        profile: String,
        state: Option<State>,
    ) -> Result<Vec<Transaction>, EndorsementError>;
}

/// `RpcBuilder` is the "send message to connection" capability
#[async_trait]
pub trait RpcBuilder: Clone + Sync + Send {
    async fn send_message(
        &self,
        connection: &Connection,
        message: Message,
    ) -> Result<(), EndorsementError>;
}

/// `LedgerBuilder` accepts a signed transaction payload and returns the ledger sequence number
#[async_trait]
pub trait LedgerBuilder: Clone + Sync + Send {
    async fn submit(&self, signed_payload: Value) -> Result<u64, EndorsementError>;
}

/// `SignerBuilder` signs and verifies opaque byte buffers
pub trait SignerBuilder: Clone + Sync + Send {
    fn public_key(&self) -> String;

    fn sign(&self, message: &[u8]) -> Result<String, EndorsementError>;

    fn verify(
        &self,
        message: &[u8],
        signature: String,
        public_key: String,
    ) -> Result<(), EndorsementError>;
}

/// `TransactionAPI` is the main entrypoint of the endorsement protocol engine
///
/// Operations named `receive_*` are driven by inbound protocol messages and take the id of the
/// connection the message arrived on. The others are local operations, triggered by a
/// write-intent producer or by the operator.
#[async_trait]
pub trait TransactionAPI: Clone + Sync + Send {
    /// `create_request` starts an author transaction: the record is persisted as `request_sent`
    /// before the `transaction-request` is delivered to the endorser connection
    async fn create_request(
        &self,
        endorser_connection_id: String,
        payload: Value,
        context: Value,
    ) -> Result<Transaction, EndorsementError>;

    async fn receive_request(
        &self,
        connection_id: String,
        request: TransactionRequest,
    ) -> Result<Transaction, EndorsementError>;

    async fn endorse(&self, transaction_id: String) -> Result<Transaction, EndorsementError>;

    async fn refuse(
        &self,
        transaction_id: String,
        reason: String,
    ) -> Result<Transaction, EndorsementError>;

    async fn receive_response(
        &self,
        connection_id: String,
        response: TransactionResponse,
    ) -> Result<TransactionOutcome, EndorsementError>;

    async fn receive_acknowledgement(
        &self,
        connection_id: String,
        ack: TransactionAcknowledgement,
    ) -> Result<Transaction, EndorsementError>;

    /// `resend` re-emits this side's last outbound message for the transaction
    async fn resend(&self, transaction_id: String) -> Result<Transaction, EndorsementError>;

    /// `request_resend` asks the counterparty to re-emit its last outbound message
    async fn request_resend(&self, transaction_id: String)
        -> Result<Transaction, EndorsementError>;

    async fn receive_transaction_resend(
        &self,
        connection_id: String,
        resend: TransactionResend,
    ) -> Result<Transaction, EndorsementError>;

    async fn cancel(&self, transaction_id: String) -> Result<Transaction, EndorsementError>;

    async fn receive_cancel(
        &self,
        connection_id: String,
        cancel: TransactionCancel,
    ) -> Result<Transaction, EndorsementError>;

    async fn get_transaction(&self, transaction_id: String)
        -> Result<Transaction, EndorsementError>;

    async fn list_transactions(
        &self,
        state: Option<State>,
    ) -> Result<Vec<Transaction>, EndorsementError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        let table = vec![
            (State::Init, false),
            (State::RequestSent, false),
            (State::RequestReceived, false),
            (State::Endorsed, false),
            (State::Refused, true),
            (State::WriteAcked, true),
            (State::WriteFailed, true),
            (State::Cancelled, true),
        ];

        for (state, expected) in table {
            assert_eq!(state.is_terminal(), expected, "state: {state}")
        }
    }

    #[test]
    fn test_state_serde_name() {
        let json = serde_json::to_string(&State::RequestSent).unwrap();
        assert_eq!(json, "\"request_sent\"");
        assert_eq!(State::WriteAcked.to_string(), "write_acked");
    }

    #[test]
    fn test_outcome_json() {
        let outcome = TransactionOutcome::Refused {
            transaction_id: "tx-1".to_string(),
            reason: "policy violation".to_string(),
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "refused");
        assert_eq!(json["reason"], "policy violation");
        assert_eq!(outcome.transaction_id(), "tx-1".to_string());
        assert!(outcome.is_refused())
    }
}
