mod handler;
mod rpc_client;

pub mod rpc_method;
pub mod rpc_param;

pub use handler::EndorsementHandler;
pub use rpc_client::RpcClient;
