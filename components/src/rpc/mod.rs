pub mod error;
pub mod lnd;
#[cfg(test)]
pub(crate) mod mock;

use crate::rpc::error::LnClientError;
use async_trait::async_trait;
use breakwater_service_api::channel::{ChannelInfo, ChannelPoint};
use breakwater_service_api::invoice::{AddedInvoice, InvoiceDescription};
use breakwater_service_api::node::NodeInfo;
use futures_util::stream::BoxStream;
use secp256k1::PublicKey;

/// Remote node operations the client is built on.
///
/// `send_payment` and `close_channel` may block for as long as the network
/// takes to settle; implementations must not put a deadline on them beyond
/// the initial call setup. Every other call is expected to be bounded.
#[async_trait]
pub trait LnRpcClient {
    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, LnClientError>;

    async fn close_channel(
        &self,
        request: CloseChannelRequest,
    ) -> Result<CloseStatusStream, LnClientError>;

    async fn get_info(&self) -> Result<NodeInfo, LnClientError>;

    async fn confirmed_wallet_balance(&self) -> Result<u64, LnClientError>;

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LnClientError>;

    async fn add_invoice<'a>(
        &self,
        amount_msat: Option<u64>,
        description: InvoiceDescription<'a>,
        expiry_secs: Option<u64>,
    ) -> Result<AddedInvoice, LnClientError>;

    async fn connect_peer(&self, peer: &PublicKey, host: &str) -> Result<(), LnClientError>;

    async fn open_channel(
        &self,
        request: OpenChannelRequest,
    ) -> Result<ChannelPoint, LnClientError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendPaymentRequest {
    pub payment_request: String,
    pub fee_limit_sat: u64,
    pub outgoing_chan_id: Option<u64>,
}

/// Raw outcome of a synchronous payment submission. `payment_error` is empty
/// on success and otherwise carries the node's error text verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendPaymentResponse {
    pub payment_error: String,
    pub payment_preimage: Vec<u8>,
    pub route: Option<RouteTotals>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteTotals {
    pub total_fees_msat: u64,
    pub total_amt_msat: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CloseChannelRequest {
    pub channel_point: ChannelPoint,
    pub force: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpenChannelRequest {
    pub peer: PublicKey,
    pub local_funding_sat: u64,
    pub push_sat: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseStatus {
    Pending { txid: Vec<u8> },
    Closed { closing_txid: Vec<u8> },
    Unrecognized(String),
}

/// Server-pushed close progress. The stream ending is the node's
/// end-of-updates signal.
pub type CloseStatusStream = BoxStream<'static, Result<CloseStatus, LnClientError>>;
