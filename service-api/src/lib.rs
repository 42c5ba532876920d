pub mod channel;
pub mod invoice;
pub mod network;
pub mod node;
pub mod payment;
pub mod service;
