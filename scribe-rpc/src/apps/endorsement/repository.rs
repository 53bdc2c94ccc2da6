use async_trait::async_trait;

use prople_scribe_core::endorsement::types::{EndorsementError, RepoBuilder, State};
use prople_scribe_core::endorsement::Transaction;

use crate::apps::db::{Instruction as DbInstruction, OutputOpts as DbOutput, Runner as DbRunner};

const TRANSACTION_KEY: &str = "transaction";

/// `TransactionRepository` stores endorsement transaction records
///
/// Records are keyed by `{profile}:transaction:{id}` so a profile only ever sees its own records.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DbRunner,
}

impl TransactionRepository {
    pub fn new(db: DbRunner) -> Self {
        Self { db }
    }

    fn build_prefix(&self, profile: &str) -> String {
        format!("{}:{}:", profile, TRANSACTION_KEY)
    }

    fn build_key(&self, profile: &str, transaction_id: &str) -> String {
        format!("{}{}", self.build_prefix(profile), transaction_id)
    }
}

#[async_trait]
impl RepoBuilder for TransactionRepository {
    async fn get(
        &self,
        profile: String,
        transaction_id: String,
    ) -> Result<Option<Transaction>, EndorsementError> {
        let output = self
            .db
            .exec(DbInstruction::GetCf {
                key: self.build_key(&profile, &transaction_id),
            })
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        let value = match output {
            DbOutput::SingleByte { value } => Ok(value),
            _ => Err(EndorsementError::RepoError(
                "unknown output type".to_string(),
            )),
        }?;

        value.map(Transaction::try_from).transpose()
    }

    async fn put(
        &self,
        profile: String,
        transaction: &Transaction,
    ) -> Result<(), EndorsementError> {
        let value: Vec<u8> = transaction.to_owned().try_into()?;

        self.db
            .exec(DbInstruction::SaveCf {
                key: self.build_key(&profile, &transaction.get_id()),
                value,
            })
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        Ok(())
    }

    async fn delete(&self, profile: String, transaction_id: String) -> Result<(), EndorsementError> {
        self.db
            .exec(DbInstruction::RemoveCf {
                key: self.build_key(&profile, &transaction_id),
            })
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        profile: String,
        state: Option<State>,
    ) -> Result<Vec<Transaction>, EndorsementError> {
        let output = self
            .db
            .exec(DbInstruction::ScanPrefixCf {
                prefix: self.build_prefix(&profile),
            })
            .await
            .map_err(|err| EndorsementError::RepoError(err.to_string()))?;

        let entries = match output {
            DbOutput::Entries { values } => Ok(values),
            _ => Err(EndorsementError::RepoError(
                "unknown output type".to_string(),
            )),
        }?;

        let mut transactions = Vec::new();
        for (_, value) in entries {
            let transaction = Transaction::try_from(value)?;
            if state.map_or(true, |expected| transaction.get_state() == expected) {
                transactions.push(transaction);
            }
        }

        Ok(transactions)
    }
}
