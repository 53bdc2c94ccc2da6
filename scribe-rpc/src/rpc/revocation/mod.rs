mod handler;

pub mod rpc_method;
pub mod rpc_param;

pub use handler::RevocationHandler;
