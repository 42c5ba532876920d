pub mod channel;
pub mod client;
pub mod payment;
pub mod rpc;
