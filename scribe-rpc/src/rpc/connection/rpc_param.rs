use serde::{Deserialize, Serialize};
use serde_json::Value;

use prople_scribe_core::connection::types::{Job, State};

use crate::common::types::CommonError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "param", content = "payload")]
pub enum Domain {
    /// Registers or updates a connection established by the DID exchange
    SaveConnection {
        #[serde(default)]
        id: Option<String>,

        #[serde(default)]
        alias: Option<String>,

        my_did: String,
        their_did: String,
        peer_addr: String,
        state: State,

        #[serde(default)]
        their_job: Option<Job>,

        /// The endorser's verification key, endorsed responses are checked against it
        #[serde(default)]
        their_verkey: Option<String>,
    },
    GetConnection {
        id: String,
    },
    ListConnections,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_connection_from_value() {
        let value = json!({
            "type": "Domain",
            "payload": {
                "param": "SaveConnection",
                "payload": {
                    "my_did": "did:prople:author",
                    "their_did": "did:prople:endorser",
                    "peer_addr": "/ip4/127.0.0.1/tcp/8181",
                    "state": "Established",
                    "their_job": "endorser",
                    "their_verkey": "endorser-verkey"
                }
            }
        });

        let param = Param::try_from(value).unwrap();
        match param {
            Param::Domain(Domain::SaveConnection {
                id,
                their_job,
                state,
                their_verkey,
                ..
            }) => {
                assert!(id.is_none());
                assert_eq!(their_verkey, Some("endorser-verkey".to_string()));
                assert_eq!(their_job, Some(Job::Endorser));
                assert_eq!(state, State::Established);
            }
            other => panic!("unexpected param: {:?}", other),
        }
    }

    #[test]
    fn test_list_connections_value() {
        let value = Param::Domain(Domain::ListConnections)
            .build_serde_value()
            .unwrap();
        assert_eq!(value, json!({"type": "Domain", "payload": {"param": "ListConnections"}}));
    }
}
