use crate::common::types::CommonError;
use crate::rpc::shared::method::{method_path, RpcMethodBuilder};
use crate::rpc::shared::types::RpcMethod;

const METHOD_SAVE_CONNECTION: &str = "connection.domain.save_connection";
const METHOD_GET_CONNECTION: &str = "connection.domain.get_connection";
const METHOD_LIST_CONNECTIONS: &str = "connection.domain.list_connections";

#[derive(Clone, Debug, PartialEq)]
pub enum Method {
    SaveConnection,
    GetConnection,
    ListConnections,
}

impl Method {
    pub fn all() -> Vec<Method> {
        vec![
            Method::SaveConnection,
            Method::GetConnection,
            Method::ListConnections,
        ]
    }
}

impl RpcMethodBuilder for Method {
    fn build_path(&self) -> &str {
        match self {
            Method::SaveConnection => METHOD_SAVE_CONNECTION,
            Method::GetConnection => METHOD_GET_CONNECTION,
            Method::ListConnections => METHOD_LIST_CONNECTIONS,
        }
    }
}

impl TryFrom<RpcMethod> for Method {
    type Error = CommonError;

    fn try_from(value: RpcMethod) -> Result<Self, Self::Error> {
        let path = method_path(&value)
            .ok_or(CommonError::MethodError(format!("unknown method: {}", value)))?;

        match path.as_str() {
            METHOD_SAVE_CONNECTION => Ok(Self::SaveConnection),
            METHOD_GET_CONNECTION => Ok(Self::GetConnection),
            METHOD_LIST_CONNECTIONS => Ok(Self::ListConnections),
            _ => Err(CommonError::MethodError(format!("unknown method: {}", value))),
        }
    }
}
