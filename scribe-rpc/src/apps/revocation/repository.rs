use async_trait::async_trait;

use prople_scribe_core::revocation::types::{
    IssuerCredRevRecord, IssuerCredRevRepoBuilder, RevocationError,
};

use crate::apps::db::{Instruction as DbInstruction, OutputOpts as DbOutput, Runner as DbRunner};

const ISSUER_CRED_REV_KEY: &str = "issuer_cred_rev";

/// `IssuerCredRevRepository` keeps issuer credential revocation records by registry index
#[derive(Clone)]
pub struct IssuerCredRevRepository {
    db: DbRunner,
}

impl IssuerCredRevRepository {
    pub fn new(db: DbRunner) -> Self {
        Self { db }
    }

    fn build_key(&self, rev_reg_id: &str, cred_rev_id: &str) -> String {
        format!("{}:{}:{}", ISSUER_CRED_REV_KEY, rev_reg_id, cred_rev_id)
    }
}

#[async_trait]
impl IssuerCredRevRepoBuilder for IssuerCredRevRepository {
    async fn save_record(&self, record: &IssuerCredRevRecord) -> Result<(), RevocationError> {
        let value = serde_json::to_vec(record)
            .map_err(|err| RevocationError::JSONError(err.to_string()))?;

        self.db
            .exec(DbInstruction::SaveCf {
                key: self.build_key(&record.rev_reg_id, &record.cred_rev_id),
                value,
            })
            .await
            .map_err(|err| RevocationError::RepoError(err.to_string()))?;

        Ok(())
    }

    async fn retrieve_by_ids(
        &self,
        rev_reg_id: String,
        cred_rev_id: String,
    ) -> Result<IssuerCredRevRecord, RevocationError> {
        let key = self.build_key(&rev_reg_id, &cred_rev_id);
        let output = self
            .db
            .exec(DbInstruction::GetCf { key: key.clone() })
            .await
            .map_err(|err| RevocationError::RepoError(err.to_string()))?;

        let value = match output {
            DbOutput::SingleByte { value } => Ok(value),
            _ => Err(RevocationError::RepoError("unknown output type".to_string())),
        }?
        .ok_or(RevocationError::RecordNotFound(key))?;

        serde_json::from_slice(&value).map_err(|err| RevocationError::JSONError(err.to_string()))
    }
}
