use serde::{Deserialize, Serialize};
use serde_json::Value;

use prople_scribe_core::revocation::types::IssuerCredRevRecord;

use crate::common::types::CommonError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "param", content = "payload")]
pub enum Domain {
    NotifyRegistry {
        cred_def_id: String,
        rev_reg_size: u32,

        #[serde(default)]
        auto_create_rev_reg: bool,

        #[serde(default)]
        create_pending_rev_reg: bool,

        #[serde(default)]
        endorser_connection_id: Option<String>,
    },
    NotifyEntry {
        rev_reg_id: String,

        #[serde(default)]
        context: Value,

        #[serde(default)]
        endorser_connection_id: Option<String>,
    },
    NotifyTails {
        rev_reg_id: String,

        #[serde(default)]
        context: Value,

        #[serde(default)]
        endorser_connection_id: Option<String>,
    },
    /// The stored record is loaded when `record` is not given
    NotifyIssuerRevoked {
        rev_reg_id: String,
        cred_rev_id: String,

        #[serde(default)]
        record: Option<IssuerCredRevRecord>,
    },
    SaveIssuerRecord {
        record: IssuerCredRevRecord,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Param {
    Domain(Domain),
}

impl Param {
    pub fn build_serde_value(&self) -> Result<Value, CommonError> {
        serde_json::to_value(self).map_err(|err| CommonError::JSONError(err.to_string()))
    }
}

impl TryFrom<Value> for Param {
    type Error = CommonError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|err| CommonError::JSONError(err.to_string()))
    }
}
