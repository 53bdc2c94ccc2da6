use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("rpc error: {0}")]
    RpcError(String),

    #[error("server error: {0}")]
    ServerError(String),
}
