use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::endorsement::types::EndorsementError;

/// `RevocationError` is a base error types for the `revocation` domain
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
pub enum RevocationError {
    #[error(transparent)]
    EndorsementError(#[from] EndorsementError),

    #[error("event error: {0}")]
    EventError(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("repo error: {0}")]
    RepoError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("json error: {0}")]
    JSONError(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Processing {
    #[serde(default)]
    pub auto_create_rev_reg: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub create_pending_rev_reg: bool,
}

/// `EndorserMetadata` is attached to an event whose write must be endorsed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EndorserMetadata {
    pub connection_id: String,
}

/// `RevocationEvent` is the metadata published for registry, entry and tails events
///
/// The `context` holds the write parameters and is opaque here. The `endorser` key is present
/// when the write must go through the endorser connection it names.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RevocationEvent {
    #[serde(default)]
    pub context: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing: Option<Processing>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endorser: Option<EndorserMetadata>,
}

impl RevocationEvent {
    pub fn new(context: Value) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    pub fn endorser_connection_id(&self) -> Option<String> {
        self.endorser
            .as_ref()
            .map(|endorser| endorser.connection_id.to_owned())
    }
}

/// `WriteIntentOutcome` is published under the `TRANSACTION_OUTCOME` category, keyed by the
/// write-intent topic, whenever a write intent does not reach a transaction of its own
///
/// An intent that became an endorsement request reports through that transaction's outcome
/// instead, keyed by its transaction id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WriteIntentOutcome {
    WriteAcked { topic: String, ledger_sequence_no: u64 },
    WriteFailed { topic: String, reason: String },

    /// The request was recorded as `request_sent` but the endorser never received it
    RequestUndelivered { topic: String, reason: String },
}

impl WriteIntentOutcome {
    pub fn topic(&self) -> &str {
        match self {
            WriteIntentOutcome::WriteAcked { topic, .. }
            | WriteIntentOutcome::WriteFailed { topic, .. }
            | WriteIntentOutcome::RequestUndelivered { topic, .. } => topic,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            WriteIntentOutcome::WriteAcked { .. } => None,
            WriteIntentOutcome::WriteFailed { reason, .. }
            | WriteIntentOutcome::RequestUndelivered { reason, .. } => Some(reason),
        }
    }
}

/// Options of a revocation registry event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryEventOptions {
    pub auto_create_rev_reg: bool,
    pub create_pending_rev_reg: bool,

    /// When set, endorser discovery is skipped and this connection is attached
    pub endorser_connection_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssuerCredRevState {
    Issued,
    Revoked,
}

/// `IssuerCredRevRecord` links an issued credential to its revocation registry index
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct IssuerCredRevRecord {
    pub record_id: String,
    pub state: IssuerCredRevState,
    pub cred_ex_id: Option<String>,
    pub rev_reg_id: String,
    pub cred_rev_id: String,
    pub cred_def_id: Option<String>,
}

#[async_trait]
pub trait IssuerCredRevRepoBuilder: Clone + Sync + Send {
    async fn save_record(&self, record: &IssuerCredRevRecord) -> Result<(), RevocationError>;

    async fn retrieve_by_ids(
        &self,
        rev_reg_id: String,
        cred_rev_id: String,
    ) -> Result<IssuerCredRevRecord, RevocationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_json_shape() {
        let table = vec![
            (RevocationEvent::new(json!({"rev_reg_id": "RR1"})), false),
            (
                RevocationEvent {
                    context: json!({"rev_reg_id": "RR1"}),
                    processing: None,
                    endorser: Some(EndorserMetadata {
                        connection_id: "E1".to_string(),
                    }),
                },
                true,
            ),
        ];

        for (event, has_endorser) in table {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value.get("endorser").is_some(), has_endorser);
            assert!(value.get("processing").is_none());
        }
    }

    #[test]
    fn test_pending_flag_only_when_set() {
        let processing = Processing {
            auto_create_rev_reg: true,
            create_pending_rev_reg: false,
        };

        let value = serde_json::to_value(&processing).unwrap();
        assert_eq!(value, json!({"auto_create_rev_reg": true}));
    }
}
