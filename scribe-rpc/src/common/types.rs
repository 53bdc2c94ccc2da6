use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum CommonError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("db error: {0}")]
    DbError(String),

    #[error("json error: {0}")]
    JSONError(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("method error: {0}")]
    MethodError(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("rpc error: {0}")]
    RpcError(String),
}

pub trait ToValidate {
    fn validate(&self) -> Result<(), CommonError>;
}
