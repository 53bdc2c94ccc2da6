use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use super::types::{
    RpcError, RpcHandler, RpcMethod, RpcRequest, RpcResponse, RpcRoute, JSONRPC_VERSION,
};

/// `RpcProcessor` routes JSON-RPC requests to the handler registered for their method
#[derive(Clone, Default)]
pub struct RpcProcessor {
    handlers: HashMap<RpcMethod, Arc<dyn RpcHandler>>,
}

impl RpcProcessor {
    pub fn register_route(&mut self, route: RpcRoute) {
        self.handlers.insert(route.method, route.handler);
    }

    pub fn routes_len(&self) -> usize {
        self.handlers.len()
    }

    pub async fn execute(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        if request.jsonrpc != JSONRPC_VERSION {
            return RpcResponse::failed(id, RpcError::InvalidRequest);
        }

        let method = RpcMethod::from(request.method);
        let handler = match self.handlers.get(&method) {
            Some(handler) => handler.clone(),
            None => {
                warn!("[rpc:execute] method not found: {}", method);
                return RpcResponse::failed(id, RpcError::MethodNotFound);
            }
        };

        debug!("[rpc:execute] method: {}", method);
        match handler.call(method.clone(), request.params).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(err) => {
                debug!("[rpc:execute] method: {} failed: {}", method, err);
                RpcResponse::failed(id, err)
            }
        }
    }

    /// `execute_bytes` parses a raw request body, a body that is not a JSON-RPC request
    /// answers with a parse error
    pub async fn execute_bytes(&self, body: &[u8]) -> RpcResponse {
        match serde_json::from_slice::<RpcRequest>(body) {
            Ok(request) => self.execute(request).await,
            Err(_) => RpcResponse::failed(None, RpcError::ParseError),
        }
    }
}
