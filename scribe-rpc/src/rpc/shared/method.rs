use super::types::RpcMethod;

pub const RPC_METHOD_PREFIX: &str = "prople.scribe";

pub trait RpcMethodBuilder {
    fn build_path(&self) -> &str;
}

pub fn build_rpc_method(method: impl RpcMethodBuilder) -> RpcMethod {
    RpcMethod::from(format!("{}.{}", RPC_METHOD_PREFIX, method.build_path()))
}

/// `method_path` strips the shared prefix off a full method name
pub fn method_path(method: &RpcMethod) -> Option<String> {
    method
        .to_string()
        .strip_prefix(&format!("{}.", RPC_METHOD_PREFIX))
        .map(|path| path.to_string())
}
