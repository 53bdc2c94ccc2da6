use std::collections::BTreeMap;

use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::messages::{
    Decision, Message, TransactionAcknowledgement, TransactionCancel, TransactionRequest,
    TransactionResponse,
};
use super::types::{
    Attachment, EndorsementError, ResponseOutcome, Side, SignatureResponse, State, TransactionID,
    SELF_CONNECTION,
};

/// `Transaction` is the record of one endorsement-gated ledger write
///
/// Each party keeps its own record under the same `id`. One of the connection ids always holds
/// [`SELF_CONNECTION`], the other points to the counterparty. Every method that changes the
/// `state` validates the transition first and leaves the record untouched on failure.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    pub(crate) id: TransactionID,
    pub(crate) state: State,
    pub(crate) author_connection_id: String,
    pub(crate) endorser_connection_id: String,
    pub(crate) messages_attach: Vec<Attachment>,
    pub(crate) signature_response: BTreeMap<String, SignatureResponse>,
    pub(crate) formats: Value,
    pub(crate) resend_count: u32,
    pub(crate) last_outbound: Option<Message>,
    pub(crate) ledger_sequence_no: Option<u64>,
    pub(crate) reason: Option<String>,

    #[serde(with = "ts_seconds")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Transaction {
    /// `new_outgoing` builds the author's record in the [`State::Init`] state
    pub fn new_outgoing(endorser_connection_id: String, payload: Value, formats: Value) -> Self {
        Self {
            id: TransactionID::generate(),
            state: State::Init,
            author_connection_id: SELF_CONNECTION.to_string(),
            endorser_connection_id,
            messages_attach: vec![Attachment::new(payload)],
            signature_response: BTreeMap::new(),
            formats,
            resend_count: 0,
            last_outbound: None,
            ledger_sequence_no: None,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// `new_incoming` builds the endorser's record from an accepted `transaction-request`
    pub fn new_incoming(author_connection_id: String, request: TransactionRequest) -> Self {
        Self {
            id: TransactionID::new(request.transaction_id),
            state: State::RequestReceived,
            author_connection_id,
            endorser_connection_id: SELF_CONNECTION.to_string(),
            messages_attach: vec![Attachment::new(request.payload)],
            signature_response: BTreeMap::new(),
            formats: request.context,
            resend_count: 0,
            last_outbound: None,
            ledger_sequence_no: None,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// `mark_request_sent` moves an author record from `init` to `request_sent` and returns the
    /// `transaction-request` message to deliver
    pub fn mark_request_sent(&mut self) -> Result<Message, EndorsementError> {
        self.expect_side(Side::Author)?;
        self.expect_state(&[State::Init], State::RequestSent)?;

        let message = Message::TransactionRequest(TransactionRequest {
            transaction_id: self.get_id(),
            payload: self.get_payload(),
            context: self.formats.to_owned(),
        });

        self.last_outbound = Some(message.clone());
        self.transit(State::RequestSent);
        Ok(message)
    }

    /// `endorse` appends the endorser signature and returns the `transaction-response` to send
    pub fn endorse(&mut self, signature: SignatureResponse) -> Result<Message, EndorsementError> {
        self.expect_side(Side::Endorser)?;
        self.expect_state(&[State::RequestReceived], State::Endorsed)?;

        self.append_signature(signature.clone());
        let message =
            Message::TransactionResponse(TransactionResponse::endorsed(self.get_id(), signature));

        self.last_outbound = Some(message.clone());
        self.transit(State::Endorsed);
        Ok(message)
    }

    pub fn refuse(&mut self, reason: String) -> Result<Message, EndorsementError> {
        self.expect_side(Side::Endorser)?;
        self.expect_state(&[State::RequestReceived], State::Refused)?;

        let message = Message::TransactionResponse(TransactionResponse::refused(
            self.get_id(),
            reason.clone(),
        ));

        self.reason = Some(reason);
        self.last_outbound = Some(message.clone());
        self.transit(State::Refused);
        Ok(message)
    }

    /// `apply_response` applies the endorser's answer on the author's record
    ///
    /// The signature is expected to be verified by the caller, this method only checks it's
    /// present for an endorsed decision.
    pub fn apply_response(
        &mut self,
        response: &TransactionResponse,
    ) -> Result<ResponseOutcome, EndorsementError> {
        self.expect_side(Side::Author)?;

        match response.decision {
            Decision::Endorsed => {
                let signature = response.signature.clone().ok_or_else(|| {
                    EndorsementError::MalformedPayload(
                        "endorsed response without signature".to_string(),
                    )
                })?;

                self.expect_state(&[State::RequestSent], State::Endorsed)?;
                self.append_signature(signature);
                self.transit(State::Endorsed);
                Ok(ResponseOutcome::Endorsed)
            }
            Decision::Refused => {
                self.expect_state(&[State::RequestSent], State::Refused)?;

                let reason = response.reason.clone().unwrap_or_default();
                self.reason = Some(reason.clone());
                self.transit(State::Refused);
                Ok(ResponseOutcome::Refused { reason })
            }
        }
    }

    /// `mark_write_acked` records the ledger sequence number of an endorsed transaction
    ///
    /// On the author's record it returns the `transaction-acknowledgement` to send, on the
    /// endorser's record it returns `None`.
    pub fn mark_write_acked(
        &mut self,
        ledger_sequence_no: u64,
    ) -> Result<Option<Message>, EndorsementError> {
        self.expect_state(&[State::Endorsed], State::WriteAcked)?;
        self.ledger_sequence_no = Some(ledger_sequence_no);

        let message = match self.get_side() {
            Side::Author => {
                let ack = Message::TransactionAcknowledgement(TransactionAcknowledgement {
                    transaction_id: self.get_id(),
                    ledger_sequence_no,
                });

                self.last_outbound = Some(ack.clone());
                Some(ack)
            }
            Side::Endorser => None,
        };

        self.transit(State::WriteAcked);
        Ok(message)
    }

    pub fn mark_write_failed(&mut self, reason: String) -> Result<(), EndorsementError> {
        self.expect_side(Side::Author)?;
        self.expect_state(&[State::Endorsed], State::WriteFailed)?;

        self.reason = Some(reason);
        self.transit(State::WriteFailed);
        Ok(())
    }

    /// `cancel` moves a not yet answered transaction to `cancelled`
    ///
    /// The author may cancel from `init` or `request_sent` and gets back the
    /// `transaction-cancel` message to send. The endorser applies a received cancel from
    /// `request_received`.
    pub fn cancel(&mut self) -> Result<Option<Message>, EndorsementError> {
        let message = match self.get_side() {
            Side::Author => {
                self.expect_state(&[State::Init, State::RequestSent], State::Cancelled)?;
                let cancel = Message::TransactionCancel(TransactionCancel {
                    transaction_id: self.get_id(),
                });

                self.last_outbound = Some(cancel.clone());
                Some(cancel)
            }
            Side::Endorser => {
                self.expect_state(&[State::RequestReceived], State::Cancelled)?;
                None
            }
        };

        self.transit(State::Cancelled);
        Ok(message)
    }

    /// `mark_resent` increments the resend counter and returns the last outbound message
    ///
    /// The state never changes. A record that has not sent anything yet has nothing to
    /// re-emit and returns `None`.
    pub fn mark_resent(&mut self) -> Result<Option<Message>, EndorsementError> {
        if self.is_terminal() {
            return Err(EndorsementError::TerminalTransaction(format!(
                "{} is {}",
                self.id, self.state
            )));
        }

        self.resend_count += 1;
        self.updated_at = Utc::now();
        Ok(self.last_outbound.clone())
    }

    pub fn counterparty_connection_id(&self) -> String {
        match self.get_side() {
            Side::Author => self.endorser_connection_id.to_owned(),
            Side::Endorser => self.author_connection_id.to_owned(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn get_side(&self) -> Side {
        if self.author_connection_id == SELF_CONNECTION {
            return Side::Author;
        }

        Side::Endorser
    }

    pub fn get_id(&self) -> String {
        self.id.to_string()
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    pub fn get_author_connection_id(&self) -> String {
        self.author_connection_id.to_owned()
    }

    pub fn get_endorser_connection_id(&self) -> String {
        self.endorser_connection_id.to_owned()
    }

    pub fn get_messages_attach(&self) -> &Vec<Attachment> {
        &self.messages_attach
    }

    pub fn get_signature_response(&self) -> &BTreeMap<String, SignatureResponse> {
        &self.signature_response
    }

    pub fn get_formats(&self) -> Value {
        self.formats.to_owned()
    }

    pub fn get_resend_count(&self) -> u32 {
        self.resend_count
    }

    pub fn get_last_outbound(&self) -> Option<Message> {
        self.last_outbound.to_owned()
    }

    pub fn get_ledger_sequence_no(&self) -> Option<u64> {
        self.ledger_sequence_no
    }

    pub fn get_reason(&self) -> Option<String> {
        self.reason.to_owned()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The unsigned ledger write request body
    pub fn get_payload(&self) -> Value {
        self.messages_attach
            .first()
            .map(|attach| attach.payload.to_owned())
            .unwrap_or(Value::Null)
    }

    /// Bytes the endorser signs and the author verifies
    pub fn signable_payload(&self) -> Result<Vec<u8>, EndorsementError> {
        serde_json::to_vec(&self.get_payload())
            .map_err(|err| EndorsementError::MalformedPayload(err.to_string()))
    }

    /// `signed_payload` is the body handed to the ledger: the request plus every signature
    pub fn signed_payload(&self) -> Value {
        json!({
            "transaction_id": self.get_id(),
            "payload": self.get_payload(),
            "signatures": self.signature_response,
        })
    }

    fn append_signature(&mut self, signature: SignatureResponse) {
        let payload = self.get_payload();
        self.messages_attach
            .push(Attachment::signed(payload, signature.clone()));
        self.signature_response
            .insert(signature.signer.to_owned(), signature);
    }

    fn expect_side(&self, side: Side) -> Result<(), EndorsementError> {
        if self.get_side() != side {
            return Err(EndorsementError::InvalidStateTransition(format!(
                "{} is not owned by the {:?} side",
                self.id, side
            )));
        }

        Ok(())
    }

    fn expect_state(&self, allowed: &[State], to: State) -> Result<(), EndorsementError> {
        if self.is_terminal() {
            return Err(EndorsementError::TerminalTransaction(format!(
                "{} is {}",
                self.id, self.state
            )));
        }

        if !allowed.contains(&self.state) {
            return Err(EndorsementError::InvalidStateTransition(format!(
                "{}: {} -> {}",
                self.id, self.state, to
            )));
        }

        Ok(())
    }

    fn transit(&mut self, to: State) {
        self.state = to;
        self.updated_at = Utc::now();
    }
}

impl TryInto<Vec<u8>> for Transaction {
    type Error = EndorsementError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| EndorsementError::MalformedPayload(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Transaction {
    type Error = EndorsementError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value)
            .map_err(|err| EndorsementError::MalformedPayload(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> SignatureResponse {
        SignatureResponse {
            signer: "did:prople:endorser".to_string(),
            signature: "c2lnbmF0dXJl".to_string(),
            verification_key: "a2V5".to_string(),
        }
    }

    fn outgoing() -> Transaction {
        Transaction::new_outgoing(
            "E1".to_string(),
            json!({"operation": "REVOC_REG_DEF"}),
            json!({"cred_def_id": "CD1"}),
        )
    }

    fn incoming() -> Transaction {
        Transaction::new_incoming(
            "A1".to_string(),
            TransactionRequest {
                transaction_id: "tx-1".to_string(),
                payload: json!({"operation": "REVOC_REG_DEF"}),
                context: json!({"cred_def_id": "CD1"}),
            },
        )
    }

    #[test]
    fn test_outgoing_request_sent() {
        let mut tx = outgoing();
        assert_eq!(tx.get_state(), State::Init);
        assert_eq!(tx.get_side(), Side::Author);
        assert_eq!(tx.counterparty_connection_id(), "E1".to_string());

        let msg = tx.mark_request_sent().unwrap();
        assert_eq!(tx.get_state(), State::RequestSent);
        assert_eq!(tx.get_last_outbound(), Some(msg.clone()));

        match msg {
            Message::TransactionRequest(request) => {
                assert_eq!(request.transaction_id, tx.get_id());
                assert_eq!(request.context["cred_def_id"], "CD1");
            }
            _ => panic!("expected transaction request"),
        }

        let again = tx.mark_request_sent();
        assert!(matches!(
            again,
            Err(EndorsementError::InvalidStateTransition(_))
        ))
    }

    #[test]
    fn test_incoming_endorse() {
        let mut tx = incoming();
        assert_eq!(tx.get_side(), Side::Endorser);
        assert_eq!(tx.get_id(), "tx-1".to_string());
        assert_eq!(tx.counterparty_connection_id(), "A1".to_string());

        let msg = tx.endorse(signature()).unwrap();
        assert_eq!(tx.get_state(), State::Endorsed);
        assert_eq!(tx.get_messages_attach().len(), 2);
        assert!(tx
            .get_signature_response()
            .contains_key("did:prople:endorser"));
        assert_eq!(msg.kind(), "transaction-response");

        let refused = tx.refuse("late".to_string());
        assert!(refused.is_err());
        assert_eq!(tx.get_state(), State::Endorsed)
    }

    #[test]
    fn test_side_guard() {
        let mut tx = outgoing();
        assert!(matches!(
            tx.endorse(signature()),
            Err(EndorsementError::InvalidStateTransition(_))
        ));

        let mut tx = incoming();
        assert!(matches!(
            tx.mark_request_sent(),
            Err(EndorsementError::InvalidStateTransition(_))
        ))
    }

    #[test]
    fn test_apply_response() {
        let mut tx = outgoing();
        tx.mark_request_sent().unwrap();

        let malformed = TransactionResponse {
            transaction_id: tx.get_id(),
            decision: Decision::Endorsed,
            signature: None,
            reason: None,
        };
        assert!(matches!(
            tx.apply_response(&malformed),
            Err(EndorsementError::MalformedPayload(_))
        ));
        assert_eq!(tx.get_state(), State::RequestSent);

        let outcome = tx
            .apply_response(&TransactionResponse::endorsed(tx.get_id(), signature()))
            .unwrap();
        assert_eq!(outcome, ResponseOutcome::Endorsed);
        assert_eq!(tx.get_state(), State::Endorsed);

        let signed = tx.signed_payload();
        assert_eq!(signed["payload"]["operation"], "REVOC_REG_DEF");
        assert!(signed["signatures"]["did:prople:endorser"].is_object());
    }

    #[test]
    fn test_apply_refused_response() {
        let mut tx = outgoing();
        tx.mark_request_sent().unwrap();

        let outcome = tx
            .apply_response(&TransactionResponse::refused(
                tx.get_id(),
                "policy violation".to_string(),
            ))
            .unwrap();

        assert_eq!(
            outcome,
            ResponseOutcome::Refused {
                reason: "policy violation".to_string()
            }
        );
        assert!(tx.is_terminal());
        assert_eq!(tx.get_reason(), Some("policy violation".to_string()));
    }

    #[test]
    fn test_endorsed_only_reaches_write_states() {
        let mut tx = outgoing();
        tx.mark_request_sent().unwrap();
        tx.apply_response(&TransactionResponse::endorsed(tx.get_id(), signature()))
            .unwrap();

        assert!(tx.cancel().is_err());
        assert!(tx.mark_resent().is_ok());

        let mut failed = tx.clone();
        failed.mark_write_failed("rejected".to_string()).unwrap();
        assert_eq!(failed.get_state(), State::WriteFailed);

        let ack = tx.mark_write_acked(42).unwrap();
        assert_eq!(tx.get_state(), State::WriteAcked);
        assert_eq!(tx.get_ledger_sequence_no(), Some(42));
        assert!(matches!(ack, Some(Message::TransactionAcknowledgement(_))));

        assert!(matches!(
            tx.mark_write_failed("late".to_string()),
            Err(EndorsementError::TerminalTransaction(_))
        ))
    }

    #[test]
    fn test_endorser_write_acked_without_message() {
        let mut tx = incoming();
        tx.endorse(signature()).unwrap();

        let ack = tx.mark_write_acked(7).unwrap();
        assert!(ack.is_none());
        assert_eq!(tx.get_state(), State::WriteAcked);
    }

    #[test]
    fn test_cancel() {
        let mut tx = outgoing();
        tx.mark_request_sent().unwrap();
        let msg = tx.cancel().unwrap();
        assert!(matches!(msg, Some(Message::TransactionCancel(_))));
        assert_eq!(tx.get_state(), State::Cancelled);

        let mut tx = incoming();
        assert!(tx.cancel().unwrap().is_none());
        assert_eq!(tx.get_state(), State::Cancelled);
    }

    #[test]
    fn test_mark_resent_keeps_state() {
        let mut tx = outgoing();
        let sent = tx.mark_request_sent().unwrap();

        let first = tx.mark_resent().unwrap();
        let second = tx.mark_resent().unwrap();
        assert_eq!(first, Some(sent.clone()));
        assert_eq!(second, Some(sent));
        assert_eq!(tx.get_state(), State::RequestSent);
        assert_eq!(tx.get_resend_count(), 2);

        let mut fresh = incoming();
        assert_eq!(fresh.mark_resent().unwrap(), None);
        assert_eq!(fresh.get_resend_count(), 1);

        fresh.refuse("nope".to_string()).unwrap();
        assert!(matches!(
            fresh.mark_resent(),
            Err(EndorsementError::TerminalTransaction(_))
        ))
    }

    #[test]
    fn test_bytes_conversion() {
        let mut tx = outgoing();
        tx.mark_request_sent().unwrap();

        let bytes: Vec<u8> = tx.clone().try_into().unwrap();
        let restored = Transaction::try_from(bytes).unwrap();
        assert_eq!(restored.get_id(), tx.get_id());
        assert_eq!(restored.get_state(), State::RequestSent);
        assert_eq!(restored.get_last_outbound(), tx.get_last_outbound());
    }
}
