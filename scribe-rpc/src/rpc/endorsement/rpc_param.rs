use serde::{Deserialize, Serialize};
use serde_json::Value;

use prople_scribe_core::endorsement::messages::Message;
use prople_scribe_core::endorsement::types::State;

use crate::common::types::CommonError;

/// `Agent` params are sent by peer agents
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "param", content = "payload")]
pub enum Agent {
    ReceiveMessage { sender_did: String, message: Message },
}

/// `Domain` params are sent by the operator of this agent
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "param", content = "payload")]
pub enum Domain {
    Endorse {
        transaction_id: String,
    },
    Refuse {
        transaction_id: String,
        reason: String,
    },
    Resend {
        transaction_id: String,
    },
    RequestResend {
        transaction_id: String,
    },
    Cancel {
        transaction_id: String,
    },
    GetTransaction {
        transaction_id: String,
    },
    ListTransactions {
        #[serde(default)]
        state: Option<State>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Param {
    Agent(Agent),
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
