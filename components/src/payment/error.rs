use crate::rpc::error::LnClientError;
use breakwater_service_api::network::Network;
use breakwater_service_api::service::{HasServiceErrorSource, ServiceErrorSource};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("invoice decode: {0}")]
    InvoiceDecode(String),
    #[error("no amount in invoice")]
    NoAmount,
    #[error("invoice is for network {invoice}, client is on {client}")]
    NetworkMismatch { invoice: String, client: Network },
    #[error("malformed preimage: {0}")]
    MalformedPreimage(std::io::Error),
    #[error("malformed payment response: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Rpc(LnClientError),
    #[error("{0}")]
    Remote(String),
    #[error("payment still in flight after {attempts} attempts")]
    StillInFlight { attempts: u32 },
}

impl HasServiceErrorSource for PaymentError {
    fn get_service_error_source(&self) -> ServiceErrorSource {
        match self {
            PaymentError::InvoiceDecode(_)
            | PaymentError::NoAmount
            | PaymentError::NetworkMismatch { .. } => ServiceErrorSource::Downstream,
            PaymentError::Rpc(e) => e.esource(),
            PaymentError::MalformedPreimage(_)
            | PaymentError::MalformedResponse(_)
            | PaymentError::Remote(_)
            | PaymentError::StillInFlight { .. } => ServiceErrorSource::Upstream,
        }
    }
}
