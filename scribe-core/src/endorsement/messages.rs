use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::SignatureResponse;

/// `Decision` is the endorser's answer carried by a `transaction-response`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Endorsed,
    Refused,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub transaction_id: String,
    pub payload: Value,

    #[serde(default)]
    pub context: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub decision: Decision,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransactionResponse {
    pub fn endorsed(transaction_id: String, signature: SignatureResponse) -> Self {
        Self {
            transaction_id,
            decision: Decision::Endorsed,
            signature: Some(signature),
            reason: None,
        }
    }

    pub fn refused(transaction_id: String, reason: String) -> Self {
        Self {
            transaction_id,
            decision: Decision::Refused,
            signature: None,
            reason: Some(reason),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionResend {
    pub transaction_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionAcknowledgement {
    pub transaction_id: String,
    pub ledger_sequence_no: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransactionCancel {
    pub transaction_id: String,
}

/// `Message` is the wire representation of the endorsement sub-protocol
///
/// It is carried inside the transport envelope, tagged by its `type`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    TransactionRequest(TransactionRequest),
    TransactionResponse(TransactionResponse),
    TransactionResend(TransactionResend),
    TransactionAcknowledgement(TransactionAcknowledgement),
    TransactionCancel(TransactionCancel),
}

impl Message {
    pub fn transaction_id(&self) -> String {
        match self {
            Message::TransactionRequest(msg) => msg.transaction_id.to_owned(),
            Message::TransactionResponse(msg) => msg.transaction_id.to_owned(),
            Message::TransactionResend(msg) => msg.transaction_id.to_owned(),
            Message::TransactionAcknowledgement(msg) => msg.transaction_id.to_owned(),
            Message::TransactionCancel(msg) => msg.transaction_id.to_owned(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::TransactionRequest(_) => "transaction-request",
            Message::TransactionResponse(_) => "transaction-response",
            Message::TransactionResend(_) => "transaction-resend",
            Message::TransactionAcknowledgement(_) => "transaction-acknowledgement",
            Message::TransactionCancel(_) => "transaction-cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_shape() {
        let msg = Message::TransactionResponse(TransactionResponse::refused(
            "tx-1".to_string(),
            "policy violation".to_string(),
        ));

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "transaction-response");
        assert_eq!(value["decision"], "refused");
        assert_eq!(value["reason"], "policy violation");
        assert!(value.get("signature").is_none());
    }

    #[test]
    fn test_parse_incoming_request() {
        let value = json!({
            "type": "transaction-request",
            "transaction_id": "tx-2",
            "payload": {"operation": "REVOC_REG_DEF"},
        });

        let msg: Message = serde_json::from_value(value).unwrap();
        assert_eq!(msg.kind(), "transaction-request");
        assert_eq!(msg.transaction_id(), "tx-2".to_string());

        match msg {
            Message::TransactionRequest(request) => assert!(request.context.is_null()),
            _ => panic!("expected a transaction request"),
        }
    }

    #[test]
    fn test_message_kinds() {
        let table = vec![
            (
                Message::TransactionResend(TransactionResend {
                    transaction_id: "a".to_string(),
                }),
                "transaction-resend",
            ),
            (
                Message::TransactionAcknowledgement(TransactionAcknowledgement {
                    transaction_id: "a".to_string(),
                    ledger_sequence_no: 10,
                }),
                "transaction-acknowledgement",
            ),
            (
                Message::TransactionCancel(TransactionCancel {
                    transaction_id: "a".to_string(),
                }),
                "transaction-cancel",
            ),
        ];

        for (msg, expected) in table {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["type"], expected);
            assert_eq!(msg.kind(), expected);
        }
    }
}
