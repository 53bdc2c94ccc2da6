use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR_CODE: i64 = -32700;
pub const INVALID_REQUEST_CODE: i64 = -32600;
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;
pub const INVALID_PARAMS_CODE: i64 = -32602;
pub const INTERNAL_ERROR_CODE: i64 = -32603;
pub const HANDLER_ERROR_CODE: i64 = -32000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RpcError {
    #[error("parse error")]
    ParseError,

    #[error("invalid request")]
    InvalidRequest,

    #[error("method not found")]
    MethodNotFound,

    #[error("invalid params")]
    InvalidParams,

    #[error("internal error")]
    InternalError,

    #[error("handler error: {0}")]
    HandlerError(String),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::ParseError => PARSE_ERROR_CODE,
            RpcError::InvalidRequest => INVALID_REQUEST_CODE,
            RpcError::MethodNotFound => METHOD_NOT_FOUND_CODE,
            RpcError::InvalidParams => INVALID_PARAMS_CODE,
            RpcError::InternalError => INTERNAL_ERROR_CODE,
            RpcError::HandlerError(_) => HANDLER_ERROR_CODE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RpcMethod(String);

impl From<String> for RpcMethod {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RpcMethod {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    IntegerVal(u64),
    StringVal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<RpcError> for RpcErrorObject {
    fn from(err: RpcError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(default)]
    pub id: Option<RpcId>,
}

impl RpcRequest {
    pub fn new(method: RpcMethod, params: Option<Value>, id: Option<RpcId>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,

    pub id: Option<RpcId>,
}

impl RpcResponse {
    pub fn success(id: Option<RpcId>, result: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result,
            error: None,
            id,
        }
    }

    pub fn failed(id: Option<RpcId>, err: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcErrorObject::from(err)),
            id,
        }
    }
}

pub type RpcHandlerOutput = Result<Option<Value>, RpcError>;

#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn call(&self, method: RpcMethod, params: Option<Value>) -> RpcHandlerOutput;
}

#[derive(Clone)]
pub struct RpcRoute {
    pub method: RpcMethod,
    pub handler: Arc<dyn RpcHandler>,
}

impl RpcRoute {
    pub fn new(method: RpcMethod, handler: Arc<dyn RpcHandler>) -> Self {
        Self { method, handler }
    }
}

/// `RPCService` is implemented by each domain handler to expose its routes
pub trait RPCService {
    fn routes(&self) -> Vec<RpcRoute>;
}
