use std::sync::Arc;

use async_trait::async_trait;
use multiaddr::Multiaddr;
use serde_json::Value;

use prople_scribe_core::connection::types::{ConnectionID, ConnectionRegistry};
use prople_scribe_core::connection::Connection;

use crate::rpc::shared::method::build_rpc_method;
use crate::rpc::shared::types::{
    RPCService, RpcError, RpcHandler, RpcHandlerOutput, RpcMethod, RpcRoute,
};

use super::rpc_method::Method;
use super::rpc_param::{Domain, Param};

/// `ConnectionHandler` lets the operator register the connections the endorsement protocol runs on
#[derive(Clone)]
pub struct ConnectionHandler<TRegistry>
where
    TRegistry: ConnectionRegistry,
{
    registry: TRegistry,
}

impl<TRegistry> ConnectionHandler<TRegistry>
where
    TRegistry: ConnectionRegistry,
{
    pub fn new(registry: TRegistry) -> Self {
        Self { registry }
    }

    async fn save_connection(&self, domain: Domain) -> RpcHandlerOutput {
        let Domain::SaveConnection {
            id,
            alias,
            my_did,
            their_did,
            peer_addr,
            state,
            their_job,
            their_verkey,
        } = domain
        else {
            return Err(RpcError::InvalidParams);
        };

        let addr: Multiaddr = peer_addr
            .parse()
            .map_err(|err: multiaddr::Error| RpcError::HandlerError(err.to_string()))?;

        let mut connection = Connection::new(my_did, their_did, addr);
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            connection = connection.with_id(ConnectionID::new(id));
        }

        if let Some(alias) = alias {
            connection = connection.with_alias(alias);
        }

        if let Some(verkey) = their_verkey {
            connection = connection.with_their_verkey(verkey);
        }

        connection.set_state(state);
        if let Some(job) = their_job {
            connection.assign_job(job);
        }

        self.registry
            .save_connection(&connection)
            .await
            .map_err(|err| RpcError::HandlerError(err.to_string()))?;

        let output = serde_json::to_value(connection).map_err(|_| RpcError::InternalError)?;
        Ok(Some(output))
    }

    async fn get_connection(&self, domain: Domain) -> RpcHandlerOutput {
        let Domain::GetConnection { id } = domain else {
            return Err(RpcError::InvalidParams);
        };

        let connection = self
            .registry
            .get_connection(id)
            .await
            .map_err(|err| RpcError::HandlerError(err.to_string()))?;

        let output = serde_json::to_value(connection).map_err(|_| RpcError::InternalError)?;
        Ok(Some(output))
    }

    async fn list_connections(&self) -> RpcHandlerOutput {
        let connections = self
            .registry
            .list_connections()
            .await
            .map_err(|err| RpcError::HandlerError(err.to_string()))?;

        let output = serde_json::to_value(connections).map_err(|_| RpcError::InternalError)?;
        Ok(Some(output))
    }
}

#[async_trait]
impl<TRegistry> RpcHandler for ConnectionHandler<TRegistry>
where
    TRegistry: ConnectionRegistry + 'static,
{
    async fn call(&self, method: RpcMethod, params: Option<Value>) -> RpcHandlerOutput {
        let rpc_method = Method::try_from(method).map_err(|_| RpcError::MethodNotFound)?;
        if rpc_method == Method::ListConnections {
            return self.list_connections().await;
        }

        let param_value = params.ok_or(RpcError::InvalidParams)?;
        let Param::Domain(domain) = Param::try_from(param_value).map_err(|_| RpcError::ParseError)?;

        match rpc_method {
            Method::SaveConnection => self.save_connection(domain).await,
            Method::GetConnection => self.get_connection(domain).await,
            Method::ListConnections => self.list_connections().await,
        }
    }
}

impl<TRegistry> RPCService for ConnectionHandler<TRegistry>
where
    TRegistry: ConnectionRegistry + 'static,
{
    fn routes(&self) -> Vec<RpcRoute> {
        let handler: Arc<dyn RpcHandler> = Arc::new(self.clone());
        Method::all()
            .into_iter()
            .map(|method| RpcRoute::new(build_rpc_method(method), handler.clone()))
            .collect()
    }
}
