use async_trait::async_trait;

use prople_scribe_core::connection::types::{
    ConnectionEntityAccessor, ConnectionError, ConnectionRegistry,
};
use prople_scribe_core::connection::Connection;

use crate::apps::db::{Instruction as DbInstruction, OutputOpts as DbOutput, Runner as DbRunner};

const CONNECTION_KEY_ID: &str = "connection_id";
const CONNECTION_KEY_DID: &str = "connection_did";

/// `ConnectionRepository` is the RocksDB backed connection registry
///
/// A connection is saved under its id, a second key indexes its id by the counterparty's DID.
#[derive(Clone)]
pub struct ConnectionRepository {
    db: DbRunner,
}

impl ConnectionRepository {
    pub fn new(db: DbRunner) -> Self {
        Self { db }
    }

    fn build_connection_key(&self, prefix: &str, val: &str) -> String {
        format!("{}:{}", prefix, val)
    }

    async fn get_id_by_did(&self, did: String) -> Result<String, ConnectionError> {
        let output = self
            .db
            .exec(DbInstruction::GetCf {
                key: self.build_connection_key(CONNECTION_KEY_DID, &did),
            })
            .await
            .map_err(|err| ConnectionError::RepoError(err.to_string()))?;

        let value_id = match output {
            DbOutput::SingleByte { value } => Ok(value),
            _ => Err(ConnectionError::RepoError("unknown output type".to_string())),
        }?
        .ok_or(ConnectionError::ConnectionNotFound(did))?;

        String::from_utf8(value_id).map_err(|err| ConnectionError::RepoError(err.to_string()))
    }
}

#[async_trait]
impl ConnectionRegistry for ConnectionRepository {
    async fn save_connection(&self, connection: &Connection) -> Result<(), ConnectionError> {
        let value: Vec<u8> = connection.to_owned().try_into()?;

        self.db
            .exec(DbInstruction::SaveCf {
                key: self.build_connection_key(CONNECTION_KEY_ID, &connection.get_id()),
                value,
            })
            .await
            .map_err(|err| ConnectionError::RepoError(err.to_string()))?;

        self.db
            .exec(DbInstruction::SaveCf {
                key: self.build_connection_key(CONNECTION_KEY_DID, &connection.get_their_did()),
                value: connection.get_id().into_bytes(),
            })
            .await
            .map_err(|err| ConnectionError::RepoError(err.to_string()))?;

        Ok(())
    }

    async fn get_connection(&self, connection_id: String) -> Result<Connection, ConnectionError> {
        let output = self
            .db
            .exec(DbInstruction::GetCf {
                key: self.build_connection_key(CONNECTION_KEY_ID, &connection_id),
            })
            .await
            .map_err(|err| ConnectionError::RepoError(err.to_string()))?;

        let value = match output {
            DbOutput::SingleByte { value } => Ok(value),
            _ => Err(ConnectionError::RepoError("unknown output type".to_string())),
        }?
        .ok_or(ConnectionError::ConnectionNotFound(connection_id))?;

        Connection::try_from(value)
    }

    async fn find_by_their_did(&self, did: String) -> Result<Connection, ConnectionError> {
        let connection_id = self.get_id_by_did(did).await?;
        self.get_connection(connection_id).await
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, ConnectionError> {
        let output = self
            .db
            .exec(DbInstruction::ScanPrefixCf {
                prefix: format!("{}:", CONNECTION_KEY_ID),
            })
            .await
            .map_err(|err| ConnectionError::RepoError(err.to_string()))?;

        let entries = match output {
            DbOutput::Entries { values } => Ok(values),
            _ => Err(ConnectionError::RepoError("unknown output type".to_string())),
        }?;

        entries
            .into_iter()
            .map(|(_, value)| Connection::try_from(value))
            .collect()
    }
}
