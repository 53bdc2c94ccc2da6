use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

use crate::connection::types::{
    ConnectionEntityAccessor, ConnectionError, ConnectionRegistry, Job, Readiness,
};
use crate::connection::Connection;
use crate::events::types::{EventCategory, Topic};
use crate::events::Notifier;
use crate::profile::Profile;

use super::locks::TransactionLocks;
use super::messages::{
    Decision, Message, TransactionAcknowledgement, TransactionCancel, TransactionRequest,
    TransactionResend, TransactionResponse,
};
use super::types::{
    EndorsementError, LedgerBuilder, RepoBuilder, ResponseOutcome, RpcBuilder, Side,
    SignatureResponse, SignerBuilder, State, TransactionAPI, TransactionOutcome,
};
use super::Transaction;

/// `Usecase` is the transaction manager of one profile
///
/// Every transition runs under the transaction's lock and is persisted before any message
/// resulting from it is delivered. Ledger submission and message delivery happen outside the
/// lock.
#[derive(Clone)]
pub struct Usecase<TRepo, TRegistry, TRpc, TLedger, TSigner>
where
    TRepo: RepoBuilder,
    TRegistry: ConnectionRegistry,
    TRpc: RpcBuilder,
    TLedger: LedgerBuilder,
    TSigner: SignerBuilder,
{
    profile: Profile,
    repo: TRepo,
    registry: TRegistry,
    rpc: TRpc,
    ledger: TLedger,
    signer: TSigner,
    notifier: Option<Notifier>,
    locks: TransactionLocks,
    submissions: TransactionLocks,
}

impl<TRepo, TRegistry, TRpc, TLedger, TSigner> Usecase<TRepo, TRegistry, TRpc, TLedger, TSigner>
where
    TRepo: RepoBuilder,
    TRegistry: ConnectionRegistry,
    TRpc: RpcBuilder,
    TLedger: LedgerBuilder,
    TSigner: SignerBuilder,
{
    pub fn new(
        profile: Profile,
        repo: TRepo,
        registry: TRegistry,
        rpc: TRpc,
        ledger: TLedger,
        signer: TSigner,
    ) -> Self {
        Self {
            profile,
            repo,
            registry,
            rpc,
            ledger,
            signer,
            notifier: None,
            locks: TransactionLocks::new(),
            submissions: TransactionLocks::new(),
        }
    }

    /// Publish terminal author outcomes through the given notifier
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn ledger(&self) -> TLedger {
        self.ledger.clone()
    }

    async fn load(&self, transaction_id: &str) -> Result<Transaction, EndorsementError> {
        self.repo
            .get(self.profile.get_name(), transaction_id.to_string())
            .await?
            .ok_or_else(|| EndorsementError::UnknownTransaction(transaction_id.to_string()))
    }

    async fn save(&self, transaction: &Transaction) -> Result<(), EndorsementError> {
        self.repo.put(self.profile.get_name(), transaction).await
    }

    async fn ready_connection(&self, connection_id: &str) -> Result<Connection, EndorsementError> {
        let readiness = self
            .registry
            .check_readiness(connection_id.to_string())
            .await
            .map_err(|err| match err {
                ConnectionError::ConnectionNotFound(msg) => EndorsementError::UnreadyConnection(
                    format!("connection not found: {msg}"),
                ),
                _ => EndorsementError::RepoError(err.to_string()),
            })?;

        match readiness {
            Readiness::Ready(connection) => Ok(connection),
            Readiness::NotReady(connection) => {
                warn!(
                    "[endorsement] connection not ready: {} state: {:?}",
                    connection.get_id(),
                    connection.get_state()
                );
                Err(EndorsementError::UnreadyConnection(connection.get_id()))
            }
        }
    }

    async fn deliver(&self, connection: &Connection, message: Message) -> Result<(), EndorsementError> {
        debug!(
            "[endorsement:deliver] kind: {} transaction: {} connection: {}",
            message.kind(),
            message.transaction_id(),
            connection.get_id()
        );

        self.rpc.send_message(connection, message).await
    }

    async fn publish_outcome(
        &self,
        transaction: &Transaction,
        outcome: &TransactionOutcome,
    ) -> Result<(), EndorsementError> {
        let Some(notifier) = &self.notifier else {
            return Ok(());
        };

        let mut metadata =
            serde_json::to_value(outcome).map_err(|err| EndorsementError::EventError(err.to_string()))?;
        metadata["context"] = transaction.get_formats();

        notifier
            .notify(
                &self.profile,
                Topic::new(EventCategory::TransactionOutcome, transaction.get_id()),
                metadata,
            )
            .await
            .map_err(|err| EndorsementError::EventError(err.to_string()))
    }

    fn ensure_counterparty(
        &self,
        transaction: &Transaction,
        connection_id: &str,
    ) -> Result<(), EndorsementError> {
        if transaction.counterparty_connection_id() != connection_id {
            warn!(
                "[endorsement] transaction: {} expected counterparty: {} got: {}",
                transaction.get_id(),
                transaction.counterparty_connection_id(),
                connection_id
            );

            return Err(EndorsementError::UnauthorizedConnection(
                connection_id.to_string(),
            ));
        }

        Ok(())
    }

    fn ensure_side(&self, transaction: &Transaction, side: Side) -> Result<(), EndorsementError> {
        if transaction.get_side() != side {
            return Err(EndorsementError::InvalidStateTransition(format!(
                "transaction {} is not owned by the {:?} side",
                transaction.get_id(),
                side
            )));
        }

        Ok(())
    }

    fn sign_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SignatureResponse, EndorsementError> {
        let message = transaction.signable_payload()?;
        let signature = self.signer.sign(&message)?;

        Ok(SignatureResponse {
            signer: self.profile.get_did(),
            signature,
            verification_key: self.signer.public_key(),
        })
    }

    /// `verify_response` checks an endorser signature against the verification key recorded on
    /// the endorser's connection, the key carried by the response must be that same key
    async fn verify_response(
        &self,
        transaction: &Transaction,
        response: &TransactionResponse,
    ) -> Result<(), EndorsementError> {
        let signature = response.signature.clone().ok_or_else(|| {
            EndorsementError::MalformedPayload("endorsed response without signature".to_string())
        })?;

        let connection = self
            .registry
            .get_connection(transaction.counterparty_connection_id())
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        let verkey = connection.get_their_verkey().ok_or_else(|| {
            EndorsementError::SignatureError(format!(
                "no verification key recorded for connection: {}",
                connection.get_id()
            ))
        })?;

        if verkey != signature.verification_key {
            warn!(
                "[endorsement:verify] transaction: {} verification key mismatch on connection: {}",
                transaction.get_id(),
                connection.get_id()
            );

            return Err(EndorsementError::SignatureError(
                "verification key does not match the endorser connection".to_string(),
            ));
        }

        if let Some(pinned) = self.profile.get_settings().endorser_public_did() {
            if pinned != signature.signer {
                return Err(EndorsementError::SignatureError(format!(
                    "unexpected signer: {}",
                    signature.signer
                )));
            }
        }

        let message = transaction.signable_payload()?;
        self.signer.verify(&message, signature.signature, verkey)
    }

    /// `submit_endorsed` hands an endorsed author transaction to the ledger and records the result
    ///
    /// At most one submission per transaction is in flight. A submission that never completed
    /// leaves the record `endorsed`, a later endorsed response for it submits again.
    async fn submit_endorsed(
        &self,
        transaction_id: String,
    ) -> Result<TransactionOutcome, EndorsementError> {
        let Some(_submission) = self.submissions.try_acquire(&transaction_id).await else {
            return Err(EndorsementError::InvalidStateTransition(format!(
                "ledger submission of {} already in progress",
                transaction_id
            )));
        };

        let transaction = self.load(&transaction_id).await?;
        if transaction.get_state() != State::Endorsed {
            return Err(EndorsementError::InvalidStateTransition(format!(
                "transaction {} is {}, not endorsed",
                transaction_id,
                transaction.get_state()
            )));
        }

        let submitted = self.ledger.submit(transaction.signed_payload()).await;

        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;

        match submitted {
            Ok(ledger_sequence_no) => {
                let ack = transaction.mark_write_acked(ledger_sequence_no)?;
                self.save(&transaction).await?;
                drop(guard);

                info!(
                    "[endorsement:submit] transaction: {} write acked, seq_no: {}",
                    transaction_id, ledger_sequence_no
                );

                if let Some(ack) = ack {
                    let delivered = match self
                        .ready_connection(&transaction.counterparty_connection_id())
                        .await
                    {
                        Ok(connection) => self.deliver(&connection, ack).await,
                        Err(err) => Err(err),
                    };

                    if let Err(err) = delivered {
                        warn!(
                            "[endorsement:submit] transaction: {} ack not delivered: {}",
                            transaction_id, err
                        );
                    }
                }

                let outcome = TransactionOutcome::WriteAcked {
                    transaction_id,
                    ledger_sequence_no,
                };
                self.publish_outcome(&transaction, &outcome).await?;
                Ok(outcome)
            }
            Err(err) => {
                transaction.mark_write_failed(err.to_string())?;
                self.save(&transaction).await?;
                drop(guard);

                warn!(
                    "[endorsement:submit] transaction: {} write failed: {}",
                    transaction_id, err
                );

                let outcome = TransactionOutcome::WriteFailed {
                    transaction_id,
                    reason: err.to_string(),
                };
                self.publish_outcome(&transaction, &outcome).await?;
                Err(EndorsementError::LedgerSubmitFailed(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl<TRepo, TRegistry, TRpc, TLedger, TSigner> TransactionAPI
    for Usecase<TRepo, TRegistry, TRpc, TLedger, TSigner>
where
    TRepo: RepoBuilder,
    TRegistry: ConnectionRegistry,
    TRpc: RpcBuilder,
    TLedger: LedgerBuilder,
    TSigner: SignerBuilder,
{
    async fn create_request(
        &self,
        endorser_connection_id: String,
        payload: Value,
        context: Value,
    ) -> Result<Transaction, EndorsementError> {
        if !self.profile.is_author() {
            return Err(EndorsementError::ValidationError(
                "only an author profile creates endorsement requests".to_string(),
            ));
        }

        if endorser_connection_id.is_empty() {
            return Err(EndorsementError::ValidationError(
                "endorser_connection_id was missing".to_string(),
            ));
        }

        if payload.is_null() {
            return Err(EndorsementError::MalformedPayload(
                "payload was missing".to_string(),
            ));
        }

        let connection = self.ready_connection(&endorser_connection_id).await?;
        if connection.get_their_job() != Some(Job::Endorser) {
            return Err(EndorsementError::UnauthorizedConnection(format!(
                "{} is not an endorser connection",
                endorser_connection_id
            )));
        }

        let mut transaction = Transaction::new_outgoing(endorser_connection_id, payload, context);
        let guard = self.locks.acquire(&transaction.get_id()).await;

        let message = transaction.mark_request_sent()?;
        self.save(&transaction).await?;
        drop(guard);

        info!(
            "[endorsement:create_request] transaction: {} endorser: {}",
            transaction.get_id(),
            connection.get_id()
        );

        self.deliver(&connection, message).await?;
        Ok(transaction)
    }

    async fn receive_request(
        &self,
        connection_id: String,
        request: TransactionRequest,
    ) -> Result<Transaction, EndorsementError> {
        if !self.profile.is_endorser() {
            return Err(EndorsementError::UnauthorizedConnection(format!(
                "profile {} does not endorse transactions",
                self.profile.get_name()
            )));
        }

        if request.transaction_id.is_empty() || request.payload.is_null() {
            return Err(EndorsementError::MalformedPayload(
                "transaction request without id or payload".to_string(),
            ));
        }

        let connection = self.ready_connection(&connection_id).await?;
        if connection.get_their_job() != Some(Job::Author) {
            warn!(
                "[endorsement:receive_request] connection: {} is not an author connection",
                connection_id
            );

            return Err(EndorsementError::UnauthorizedConnection(connection_id));
        }

        let guard = self.locks.acquire(&request.transaction_id).await;
        let existing = self
            .repo
            .get(self.profile.get_name(), request.transaction_id.to_owned())
            .await?;

        if let Some(mut transaction) = existing {
            self.ensure_counterparty(&transaction, &connection_id)?;

            debug!(
                "[endorsement:receive_request] duplicate delivery of transaction: {}",
                transaction.get_id()
            );

            let last = transaction.mark_resent()?;
            self.save(&transaction).await?;
            drop(guard);

            if let Some(message) = last {
                self.deliver(&connection, message).await?;
            }

            return Ok(transaction);
        }

        let mut transaction = Transaction::new_incoming(connection_id, request);
        let reply = if self.profile.get_settings().policy.auto_endorse {
            let signature = self.sign_transaction(&transaction)?;
            Some(transaction.endorse(signature)?)
        } else {
            None
        };

        self.save(&transaction).await?;
        drop(guard);

        info!(
            "[endorsement:receive_request] transaction: {} state: {}",
            transaction.get_id(),
            transaction.get_state()
        );

        if let Some(message) = reply {
            self.deliver(&connection, message).await?;
        }

        Ok(transaction)
    }

    async fn endorse(&self, transaction_id: String) -> Result<Transaction, EndorsementError> {
        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;
        self.ensure_side(&transaction, Side::Endorser)?;

        let connection = self
            .ready_connection(&transaction.counterparty_connection_id())
            .await?;

        let signature = self.sign_transaction(&transaction)?;
        let message = transaction.endorse(signature)?;
        self.save(&transaction).await?;
        drop(guard);

        info!("[endorsement:endorse] transaction: {}", transaction_id);
        self.deliver(&connection, message).await?;
        Ok(transaction)
    }

    async fn refuse(
        &self,
        transaction_id: String,
        reason: String,
    ) -> Result<Transaction, EndorsementError> {
        if reason.trim().is_empty() {
            return Err(EndorsementError::ValidationError(
                "refusal reason was missing".to_string(),
            ));
        }

        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;
        self.ensure_side(&transaction, Side::Endorser)?;

        let connection = self
            .ready_connection(&transaction.counterparty_connection_id())
            .await?;

        let message = transaction.refuse(reason)?;
        self.save(&transaction).await?;
        drop(guard);

        info!("[endorsement:refuse] transaction: {}", transaction_id);
        self.deliver(&connection, message).await?;
        Ok(transaction)
    }

    async fn receive_response(
        &self,
        connection_id: String,
        response: TransactionResponse,
    ) -> Result<TransactionOutcome, EndorsementError> {
        let transaction_id = response.transaction_id.to_owned();

        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;
        self.ensure_counterparty(&transaction, &connection_id)?;
        self.ensure_side(&transaction, Side::Author)?;

        if response.decision == Decision::Endorsed {
            match transaction.get_state() {
                State::RequestSent => self.verify_response(&transaction, &response).await?,
                State::Endorsed => {
                    self.verify_response(&transaction, &response).await?;
                    drop(guard);

                    info!(
                        "[endorsement:receive_response] transaction: {} endorsed again, resubmitting",
                        transaction_id
                    );
                    return self.submit_endorsed(transaction_id).await;
                }
                _ => {}
            }
        }

        let outcome = transaction.apply_response(&response)?;
        self.save(&transaction).await?;
        drop(guard);

        info!(
            "[endorsement:receive_response] transaction: {} state: {}",
            transaction_id,
            transaction.get_state()
        );

        match outcome {
            ResponseOutcome::Refused { reason } => {
                let outcome = TransactionOutcome::Refused {
                    transaction_id,
                    reason,
                };
                self.publish_outcome(&transaction, &outcome).await?;
                Ok(outcome)
            }
            ResponseOutcome::Endorsed => self.submit_endorsed(transaction_id).await,
        }
    }

    async fn receive_acknowledgement(
        &self,
        connection_id: String,
        ack: TransactionAcknowledgement,
    ) -> Result<Transaction, EndorsementError> {
        let _guard = self.locks.acquire(&ack.transaction_id).await;
        let mut transaction = self.load(&ack.transaction_id).await?;
        self.ensure_counterparty(&transaction, &connection_id)?;
        self.ensure_side(&transaction, Side::Endorser)?;

        transaction.mark_write_acked(ack.ledger_sequence_no)?;
        self.save(&transaction).await?;

        info!(
            "[endorsement:receive_acknowledgement] transaction: {} seq_no: {}",
            ack.transaction_id, ack.ledger_sequence_no
        );
        Ok(transaction)
    }

    async fn resend(&self, transaction_id: String) -> Result<Transaction, EndorsementError> {
        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;
        if transaction.is_terminal() {
            return Err(EndorsementError::TerminalTransaction(transaction_id));
        }

        let connection = self
            .ready_connection(&transaction.counterparty_connection_id())
            .await?;

        let last = transaction.mark_resent()?;
        self.save(&transaction).await?;
        drop(guard);

        if let Some(message) = last {
            self.deliver(&connection, message).await?;
        }

        Ok(transaction)
    }

    async fn request_resend(
        &self,
        transaction_id: String,
    ) -> Result<Transaction, EndorsementError> {
        let guard = self.locks.acquire(&transaction_id).await;
        let transaction = self.load(&transaction_id).await?;
        if transaction.is_terminal() {
            return Err(EndorsementError::TerminalTransaction(transaction_id));
        }

        let connection = self
            .ready_connection(&transaction.counterparty_connection_id())
            .await?;
        drop(guard);

        self.deliver(
            &connection,
            Message::TransactionResend(TransactionResend {
                transaction_id: transaction.get_id(),
            }),
        )
        .await?;

        Ok(transaction)
    }

    async fn receive_transaction_resend(
        &self,
        connection_id: String,
        resend: TransactionResend,
    ) -> Result<Transaction, EndorsementError> {
        let guard = self.locks.acquire(&resend.transaction_id).await;
        let mut transaction = self.load(&resend.transaction_id).await?;
        self.ensure_counterparty(&transaction, &connection_id)?;

        if transaction.is_terminal() {
            return Err(EndorsementError::TerminalTransaction(resend.transaction_id));
        }

        let connection = self.ready_connection(&connection_id).await?;
        let last = transaction.mark_resent()?;
        self.save(&transaction).await?;
        drop(guard);

        debug!(
            "[endorsement:receive_transaction_resend] transaction: {} resend_count: {}",
            transaction.get_id(),
            transaction.get_resend_count()
        );

        if let Some(message) = last {
            self.deliver(&connection, message).await?;
        }

        Ok(transaction)
    }

    async fn cancel(&self, transaction_id: String) -> Result<Transaction, EndorsementError> {
        let guard = self.locks.acquire(&transaction_id).await;
        let mut transaction = self.load(&transaction_id).await?;
        self.ensure_side(&transaction, Side::Author)?;

        let connection = self
            .ready_connection(&transaction.counterparty_connection_id())
            .await?;

        let message = transaction.cancel()?;
        self.save(&transaction).await?;
        drop(guard);

        info!("[endorsement:cancel] transaction: {}", transaction_id);

        if let Some(message) = message {
            self.deliver(&connection, message).await?;
        }

        let outcome = TransactionOutcome::Cancelled { transaction_id };
        self.publish_outcome(&transaction, &outcome).await?;
        Ok(transaction)
    }

    async fn receive_cancel(
        &self,
        connection_id: String,
        cancel: TransactionCancel,
    ) -> Result<Transaction, EndorsementError> {
        let _guard = self.locks.acquire(&cancel.transaction_id).await;
        let mut transaction = self.load(&cancel.transaction_id).await?;
        self.ensure_counterparty(&transaction, &connection_id)?;
        self.ensure_side(&transaction, Side::Endorser)?;

        transaction.cancel()?;
        self.save(&transaction).await?;

        info!(
            "[endorsement:receive_cancel] transaction: {}",
            cancel.transaction_id
        );
        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        transaction_id: String,
    ) -> Result<Transaction, EndorsementError> {
        if transaction_id.is_empty() {
            return Err(EndorsementError::ValidationError(
                "transaction_id was missing".to_string(),
            ));
        }

        self.load(&transaction_id).await
    }

    async fn list_transactions(
        &self,
        state: Option<State>,
    ) -> Result<Vec<Transaction>, EndorsementError> {
        self.repo.list(self.profile.get_name(), state).await
    }
}
