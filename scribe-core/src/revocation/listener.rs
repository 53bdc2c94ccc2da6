use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{json, Value};

use crate::endorsement::types::{EndorsementError, LedgerBuilder, TransactionAPI};
use crate::events::types::{Event, EventCategory, EventError, Listener, Topic};
use crate::events::Notifier;

use super::types::{RevocationEvent, WriteIntentOutcome};

/// Categories carrying a ledger write
pub const WRITE_CATEGORIES: [EventCategory; 3] = [
    EventCategory::RevocationRegistry,
    EventCategory::RevocationEntry,
    EventCategory::RevocationTails,
];

/// `EndorsementListener` turns revocation write intents into ledger writes for one profile
///
/// An event carrying `endorser` metadata becomes an endorsement request on the named connection.
/// Without it the write goes straight to the ledger. Events of other profiles are ignored.
///
/// The bus swallows listener errors, so with a notifier attached every write that does not turn
/// into a transaction is reported back as a [`WriteIntentOutcome`].
#[derive(Clone)]
pub struct EndorsementListener<TTransactionAPI, TLedger>
where
    TTransactionAPI: TransactionAPI,
    TLedger: LedgerBuilder,
{
    profile: String,
    manager: TTransactionAPI,
    ledger: TLedger,
    notifier: Option<Notifier>,
}

impl<TTransactionAPI, TLedger> EndorsementListener<TTransactionAPI, TLedger>
where
    TTransactionAPI: TransactionAPI,
    TLedger: LedgerBuilder,
{
    pub fn new(profile: String, manager: TTransactionAPI, ledger: TLedger) -> Self {
        Self {
            profile,
            manager,
            ledger,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn report(&self, outcome: WriteIntentOutcome, context: Value) -> Result<(), EventError> {
        let Some(notifier) = &self.notifier else {
            return Ok(());
        };

        let topic = Topic::new(EventCategory::TransactionOutcome, outcome.topic());
        let mut payload =
            serde_json::to_value(&outcome).map_err(|err| EventError::JSONError(err.to_string()))?;
        payload["context"] = context;

        let event = Event {
            profile: self.profile.to_owned(),
            topic,
            payload,
        };

        notifier.bus().publish(event).await.map(|_| ())
    }
}

#[async_trait]
impl<TTransactionAPI, TLedger> Listener for EndorsementListener<TTransactionAPI, TLedger>
where
    TTransactionAPI: TransactionAPI + 'static,
    TLedger: LedgerBuilder + 'static,
{
    async fn on_event(&self, event: Event) -> Result<(), EventError> {
        if event.profile != self.profile || !WRITE_CATEGORIES.contains(&event.category()) {
            return Ok(());
        }

        let topic = event.topic.to_string();
        let metadata: RevocationEvent = serde_json::from_value(event.payload)
            .map_err(|err| EventError::JSONError(err.to_string()))?;

        let payload = json!({
            "operation": topic,
            "context": metadata.context,
        });

        let context = metadata.context.clone();
        let outcome = match metadata.endorser_connection_id() {
            Some(connection_id) => {
                match self
                    .manager
                    .create_request(connection_id, payload, json!({ "topic": topic }))
                    .await
                {
                    Ok(transaction) => {
                        debug!(
                            "[revocation:listener] topic: {} transaction: {}",
                            topic,
                            transaction.get_id()
                        );
                        return Ok(());
                    }
                    Err(EndorsementError::SendError(reason)) => {
                        WriteIntentOutcome::RequestUndelivered { topic, reason }
                    }
                    Err(err) => WriteIntentOutcome::WriteFailed {
                        topic,
                        reason: err.to_string(),
                    },
                }
            }
            None => match self.ledger.submit(payload).await {
                Ok(ledger_sequence_no) => {
                    info!(
                        "[revocation:listener] topic: {} written directly, seq_no: {}",
                        topic, ledger_sequence_no
                    );

                    self.report(
                        WriteIntentOutcome::WriteAcked {
                            topic,
                            ledger_sequence_no,
                        },
                        context,
                    )
                    .await?;
                    return Ok(());
                }
                Err(err) => WriteIntentOutcome::WriteFailed {
                    topic,
                    reason: err.to_string(),
                },
            },
        };

        warn!("[revocation:listener] write intent not carried out: {:?}", outcome);

        let reason = outcome.reason().unwrap_or_default().to_string();
        self.report(outcome, context).await?;
        Err(EventError::ListenerError(reason))
    }
}
