pub mod endpoint;
pub mod method;
pub mod processor;
pub mod types;
