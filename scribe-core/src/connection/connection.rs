use chrono::serde::ts_seconds;
use chrono::serde::ts_milliseconds_option;
use chrono::{DateTime, Utc};
use multiaddr::Multiaddr;
use serde::{Deserialize, Serialize};

use super::types::{ConnectionEntityAccessor, ConnectionError, ConnectionID, Job, State};

/// `Connection` is a channel to a peer agent
///
/// The `peer_addr` is the network address of the peer agent, used by the transport to deliver
/// protocol messages. The `their_job` property is assigned once both agents agreed on their
/// parts in the endorsement protocol, `job_assigned_at` records when it was last assigned.
/// The `their_verkey` is the counterparty's verification key, exchanged out of band, an endorser
/// signature is only accepted when it verifies under this key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Connection {
    pub(crate) id: ConnectionID,
    pub(crate) alias: Option<String>,
    pub(crate) my_did: String,
    pub(crate) their_did: String,
    pub(crate) peer_addr: Multiaddr,
    pub(crate) state: State,
    pub(crate) their_job: Option<Job>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) their_verkey: Option<String>,

    #[serde(with = "ts_milliseconds_option")]
    pub(crate) job_assigned_at: Option<DateTime<Utc>>,

    #[serde(with = "ts_seconds")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(my_did: String, their_did: String, peer_addr: Multiaddr) -> Self {
        Self {
            id: ConnectionID::generate(),
            alias: None,
            my_did,
            their_did,
            peer_addr,
            state: State::Pending,
            their_job: None,
            their_verkey: None,
            job_assigned_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: ConnectionID) -> Self {
        self.id = id;
        self
    }

    pub fn with_alias(mut self, alias: String) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn with_their_verkey(mut self, verkey: String) -> Self {
        self.their_verkey = Some(verkey);
        self
    }

    pub fn set_state(&mut self, state: State) -> &mut Self {
        self.state = state;
        self.updated_at = Utc::now();
        self
    }

    /// `assign_job` used to record the part the counterparty plays, the assignment time is
    /// used to rank multiple candidates
    pub fn assign_job(&mut self, job: Job) -> &mut Self {
        self.assign_job_at(job, Utc::now())
    }

    pub fn assign_job_at(&mut self, job: Job, at: DateTime<Utc>) -> &mut Self {
        self.their_job = Some(job);
        self.job_assigned_at = Some(at);
        self.updated_at = Utc::now();
        self
    }

    pub fn is_ready(&self) -> bool {
        self.state == State::Established
    }

    pub fn get_peer_addr(&self) -> Multiaddr {
        self.peer_addr.to_owned()
    }

    pub fn get_their_verkey(&self) -> Option<String> {
        self.their_verkey.to_owned()
    }

    pub fn get_job_assigned_at(&self) -> Option<DateTime<Utc>> {
        self.job_assigned_at.to_owned()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.to_owned()
    }
}

impl ConnectionEntityAccessor for Connection {
    fn get_id(&self) -> String {
        self.id.to_string()
    }

    fn get_alias(&self) -> Option<String> {
        self.alias.to_owned()
    }

    fn get_my_did(&self) -> String {
        self.my_did.to_owned()
    }

    fn get_their_did(&self) -> String {
        self.their_did.to_owned()
    }

    fn get_state(&self) -> State {
        self.state
    }

    fn get_their_job(&self) -> Option<Job> {
        self.their_job
    }
}

impl TryInto<Vec<u8>> for Connection {
    type Error = ConnectionError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        let json =
            serde_json::to_vec(&self).map_err(|err| ConnectionError::JSONError(err.to_string()))?;
        Ok(json)
    }
}

impl TryFrom<Vec<u8>> for Connection {
    type Error = ConnectionError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let connection: Connection = serde_json::from_slice(&value)
            .map_err(|err| ConnectionError::JSONUnserializeError(err.to_string()))?;
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiaddr::multiaddr;

    fn generate_connection() -> Connection {
        let addr = multiaddr!(Ip4([127, 0, 0, 1]), Tcp(8080u16));
        Connection::new(
            "did:prople:me".to_string(),
            "did:prople:peer".to_string(),
            addr,
        )
    }

    #[test]
    fn test_new_connection_not_ready() {
        let connection = generate_connection();
        assert!(!connection.is_ready());
        assert!(connection.get_their_job().is_none());
        assert!(connection.get_job_assigned_at().is_none());
        assert!(!connection.get_id().is_empty())
    }

    #[test]
    fn test_established_connection_ready() {
        let mut connection = generate_connection();
        connection.set_state(State::Established);
        assert!(connection.is_ready())
    }

    #[test]
    fn test_assign_job() {
        let mut connection = generate_connection();
        connection.assign_job(Job::Endorser);
        assert_eq!(connection.get_their_job(), Some(Job::Endorser));
        assert!(connection.get_job_assigned_at().is_some())
    }

    #[test]
    fn test_bytes_conversion() {
        let mut connection = generate_connection()
            .with_alias("endorser".to_string())
            .with_their_verkey("endorser-verkey".to_string());
        connection
            .set_state(State::Established)
            .assign_job(Job::Author);

        let bytes: Result<Vec<u8>, ConnectionError> = connection.clone().try_into();
        assert!(bytes.is_ok());

        let restored = Connection::try_from(bytes.unwrap());
        assert!(restored.is_ok());

        let restored = restored.unwrap();
        assert_eq!(restored.get_id(), connection.get_id());
        assert_eq!(restored.get_alias(), Some("endorser".to_string()));
        assert_eq!(restored.get_their_job(), Some(Job::Author));
        assert_eq!(restored.get_peer_addr(), connection.get_peer_addr());
        assert_eq!(restored.get_their_verkey(), Some("endorser-verkey".to_string()));
    }

    #[test]
    fn test_verkey_is_optional_in_stored_bytes() {
        let connection = generate_connection();
        let bytes: Vec<u8> = connection.clone().try_into().unwrap();
        assert!(!String::from_utf8_lossy(&bytes).contains("their_verkey"));

        let restored = Connection::try_from(bytes).unwrap();
        assert!(restored.get_their_verkey().is_none());
    }
}
