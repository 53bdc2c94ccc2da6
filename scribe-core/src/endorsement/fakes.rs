//! In-memory collaborators used by the multi-party tests
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use multiaddr::multiaddr;
use serde_json::Value;

use crate::connection::types::{
    ConnectionEntityAccessor, ConnectionError, ConnectionID, ConnectionRegistry, Job, State as ConnState,
};
use crate::connection::Connection;

use super::messages::Message;
use super::types::{
    EndorsementError, LedgerBuilder, RepoBuilder, RpcBuilder, SignerBuilder, State,
};
use super::Transaction;

#[derive(Clone, Default)]
pub struct MemoryRepo {
    records: Arc<Mutex<HashMap<(String, String), Transaction>>>,
}

impl MemoryRepo {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RepoBuilder for MemoryRepo {
    async fn get(
        &self,
        profile: String,
        transaction_id: String,
    ) -> Result<Option<Transaction>, EndorsementError> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&(profile, transaction_id)).cloned())
    }

    async fn put(&self, profile: String, transaction: &Transaction) -> Result<(), EndorsementError> {
        let mut records = self.records.lock().unwrap();
        records.insert((profile, transaction.get_id()), transaction.clone());
        Ok(())
    }

    async fn delete(&self, profile: String, transaction_id: String) -> Result<(), EndorsementError> {
        let mut records = self.records.lock().unwrap();
        records.remove(&(profile, transaction_id));
        Ok(())
    }

    async fn list(
        &self,
        profile: String,
        state: Option<State>,
    ) -> Result<Vec<Transaction>, EndorsementError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|((owner, _), _)| owner == &profile)
            .map(|(_, tx)| tx.clone())
            .filter(|tx| state.map_or(true, |state| tx.get_state() == state))
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MemoryRegistry {
    connections: Arc<Mutex<HashMap<String, Connection>>>,
}

impl MemoryRegistry {
    pub fn with(connections: Vec<Connection>) -> Self {
        let registry = Self::default();
        for conn in connections {
            registry
                .connections
                .lock()
                .unwrap()
                .insert(conn.get_id(), conn);
        }
        registry
    }

    pub fn set_state(&self, connection_id: &str, state: ConnState) {
        if let Some(conn) = self.connections.lock().unwrap().get_mut(connection_id) {
            conn.set_state(state);
        }
    }
}

#[async_trait]
impl ConnectionRegistry for MemoryRegistry {
    async fn save_connection(&self, connection: &Connection) -> Result<(), ConnectionError> {
        self.connections
            .lock()
            .unwrap()
            .insert(connection.get_id(), connection.clone());
        Ok(())
    }

    async fn get_connection(&self, connection_id: String) -> Result<Connection, ConnectionError> {
        self.connections
            .lock()
            .unwrap()
            .get(&connection_id)
            .cloned()
            .ok_or(ConnectionError::ConnectionNotFound(connection_id))
    }

    async fn find_by_their_did(&self, did: String) -> Result<Connection, ConnectionError> {
        self.connections
            .lock()
            .unwrap()
            .values()
            .find(|conn| conn.get_their_did() == did)
            .cloned()
            .ok_or(ConnectionError::ConnectionNotFound(did))
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, ConnectionError> {
        Ok(self.connections.lock().unwrap().values().cloned().collect())
    }
}

/// Records every outbound message with the id of the connection it was sent to
#[derive(Clone, Default)]
pub struct RecordingResponder {
    sent: Arc<Mutex<Vec<(String, Message)>>>,
}

impl RecordingResponder {
    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<(String, Message)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<(String, Message)> {
        self.sent.lock().unwrap().drain(..).collect()
    }
}

#[async_trait]
impl RpcBuilder for RecordingResponder {
    async fn send_message(
        &self,
        connection: &Connection,
        message: Message,
    ) -> Result<(), EndorsementError> {
        self.sent
            .lock()
            .unwrap()
            .push((connection.get_id(), message));
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeLedger {
    next_seq_no: Option<u64>,
    submitted: Arc<Mutex<Vec<Value>>>,
}

impl FakeLedger {
    pub fn accepting(seq_no: u64) -> Self {
        Self {
            next_seq_no: Some(seq_no),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            next_seq_no: None,
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn submitted(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerBuilder for FakeLedger {
    async fn submit(&self, signed_payload: Value) -> Result<u64, EndorsementError> {
        self.submitted.lock().unwrap().push(signed_payload);
        self.next_seq_no.ok_or(EndorsementError::LedgerSubmitFailed(
            "ledger rejected the transaction".to_string(),
        ))
    }
}

/// Deterministic signer, the signature is the key followed by the signed bytes
#[derive(Clone)]
pub struct FakeSigner {
    key: String,
}

impl FakeSigner {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl SignerBuilder for FakeSigner {
    fn public_key(&self) -> String {
        self.key.to_owned()
    }

    fn sign(&self, message: &[u8]) -> Result<String, EndorsementError> {
        Ok(format!("{}:{}", self.key, String::from_utf8_lossy(message)))
    }

    fn verify(
        &self,
        message: &[u8],
        signature: String,
        public_key: String,
    ) -> Result<(), EndorsementError> {
        if signature != format!("{}:{}", public_key, String::from_utf8_lossy(message)) {
            return Err(EndorsementError::SignatureError(
                "signature mismatch".to_string(),
            ));
        }

        Ok(())
    }
}

pub fn ready_connection(id: &str, my_did: &str, their_did: &str, job: Job) -> Connection {
    let mut conn = Connection::new(
        my_did.to_string(),
        their_did.to_string(),
        multiaddr!(Ip4([127, 0, 0, 1]), Tcp(8080u16)),
    )
    .with_id(ConnectionID::new(id))
    .with_alias("peer".to_string());

    conn.set_state(ConnState::Established)
        .assign_job_at(job, Utc::now());
    conn
}

/// An established endorser connection whose verification key was exchanged out of band
pub fn endorser_connection(id: &str, my_did: &str, their_did: &str, verkey: &str) -> Connection {
    ready_connection(id, my_did, their_did, Job::Endorser).with_their_verkey(verkey.to_string())
}
