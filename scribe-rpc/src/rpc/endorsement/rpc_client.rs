use async_trait::async_trait;
use log::debug;

use prople_scribe_core::connection::types::ConnectionEntityAccessor;
use prople_scribe_core::connection::Connection;
use prople_scribe_core::endorsement::messages::Message;
use prople_scribe_core::endorsement::types::{EndorsementError, RpcBuilder};

use crate::rpc::shared::endpoint::build_endpoint;
use crate::rpc::shared::method::build_rpc_method;
use crate::rpc::shared::types::{RpcId, RpcRequest, RpcResponse};

use super::rpc_method::Method;
use super::rpc_param::{Agent, Param};

/// `RpcClient` delivers protocol messages to the peer agent behind a connection
///
/// The message is posted to the peer's `/rpc` endpoint, signed off with our DID on that
/// connection so the peer can resolve the connection it arrived on.
#[derive(Clone, Default)]
pub struct RpcClient {
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RpcBuilder for RpcClient {
    async fn send_message(
        &self,
        connection: &Connection,
        message: Message,
    ) -> Result<(), EndorsementError> {
        let endpoint = build_endpoint(connection.get_peer_addr())
            .map_err(|err| EndorsementError::SendError(err.to_string()))?;

        let request_id = RpcId::StringVal(message.transaction_id());
        let param = Param::Agent(Agent::ReceiveMessage {
            sender_did: connection.get_my_did(),
            message,
        })
        .build_serde_value()
        .map_err(|err| EndorsementError::SendError(err.to_string()))?;

        let request = RpcRequest::new(
            build_rpc_method(Method::ReceiveMessage),
            Some(param),
            Some(request_id),
        );

        debug!(
            "[rpc:send_message] connection: {} endpoint: {}",
            connection.get_id(),
            endpoint
        );

        let response = self
            .client
            .post(format!("{}/rpc", endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|err| EndorsementError::SendError(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EndorsementError::SendError(format!(
                "unexpected status: {}",
                status
            )));
        }

        let rpc_response: RpcResponse = response
            .json()
            .await
            .map_err(|err| EndorsementError::SendError(err.to_string()))?;

        match rpc_response.error {
            Some(err) => Err(EndorsementError::SendError(format!(
                "{}: {}",
                err.code, err.message
            ))),
            None => Ok(()),
        }
    }
}
