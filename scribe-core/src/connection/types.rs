use async_trait::async_trait;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Connection;

/// `ConnectionError` is a base error types for the `connection` domain
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
pub enum ConnectionError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("json error: {0}")]
    JSONError(String),

    #[error("json unserialize error: {0}")]
    JSONUnserializeError(String),

    #[error("repo error: {0}")]
    RepoError(String),
}

/// Unique identifier of a connection record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
pub struct ConnectionID(String);

impl ConnectionID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// State represent the connection's DID exchange progress
///
/// Only an [`State::Established`] connection is considered ready: both agents completed the
/// mutual DID exchange and messages may flow in either direction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Pending,
    Requested,
    Established,
    Abandoned,
}

/// `Job` is the part the counterparty of a connection plays in the endorsement protocol
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Job {
    Author,
    Endorser,
}

/// `Readiness` is the result of a readiness check of a connection
///
/// A not-ready connection is a regular outcome, not an error, callers decide how to react.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready(Connection),
    NotReady(Connection),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }
}

/// `ConnectionEntityAccessor` it's a special trait used to access main Connection entity
/// property fields.
pub trait ConnectionEntityAccessor: Clone {
    fn get_id(&self) -> String;
    fn get_alias(&self) -> Option<String>;
    fn get_my_did(&self) -> String;
    fn get_their_did(&self) -> String;
    fn get_state(&self) -> State;
    fn get_their_job(&self) -> Option<Job>;
}

/// `ConnectionRegistry` is the connection registry abstraction by implementing repository pattern
///
/// The registry is a pure read model for the endorsement protocol, except for
/// [`ConnectionRegistry::save_connection`] which is used by the operator surface to register
/// connections established elsewhere.
#[async_trait]
pub trait ConnectionRegistry: Clone + Sync + Send {
    async fn save_connection(&self, connection: &Connection) -> Result<(), ConnectionError>;

    async fn get_connection(&self, connection_id: String) -> Result<Connection, ConnectionError>;

    async fn find_by_their_did(&self, did: String) -> Result<Connection, ConnectionError>;

    async fn list_connections(&self) -> Result<Vec<Connection>, ConnectionError>;

    /// `check_readiness` used to resolve a connection id into its [`Readiness`]
    async fn check_readiness(&self, connection_id: String) -> Result<Readiness, ConnectionError> {
        let connection = self.get_connection(connection_id).await?;
        if connection.is_ready() {
            return Ok(Readiness::Ready(connection));
        }

        Ok(Readiness::NotReady(connection))
    }
}
