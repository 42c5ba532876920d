use crate::channel::relay::{CloseChannelHandles, CloseUpdateRelay};
use crate::payment::dispatch::PaymentDispatcher;
use crate::payment::resolve::PaymentResolver;
use crate::payment::{PaymentAttempt, PaymentPollConfig, PaymentResult};
use crate::rpc::error::LnClientError;
use crate::rpc::{CloseChannelRequest, LnRpcClient, OpenChannelRequest};
use breakwater_service_api::channel::{ChannelInfo, ChannelPoint};
use breakwater_service_api::invoice::{AddedInvoice, InvoiceDescription};
use breakwater_service_api::network::Network;
use breakwater_service_api::node::NodeInfo;
use log::{debug, info};
use secp256k1::PublicKey;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Client for one remote Lightning node.
///
/// Payments and channel closes run in the background and report through
/// the handles they return; everything else is a direct call.
pub struct LightningClient<R> {
    rpc: Arc<R>,
    network: Network,
    dispatcher: PaymentDispatcher<R>,
}

impl<R> LightningClient<R>
where
    R: LnRpcClient + Send + Sync + 'static,
{
    pub fn new(rpc: R, network: Network, poll: PaymentPollConfig) -> Self {
        let rpc = Arc::new(rpc);
        let resolver = PaymentResolver::new(rpc.clone(), network, poll);
        Self {
            rpc,
            network,
            dispatcher: PaymentDispatcher::new(resolver),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Pays `payment_request`, spending at most `max_fee_sat` in fees.
    pub fn pay_invoice(
        &self,
        cancel: CancellationToken,
        payment_request: String,
        max_fee_sat: u64,
        outgoing_chan_id: Option<u64>,
    ) -> oneshot::Receiver<PaymentResult> {
        self.dispatcher.dispatch(
            PaymentAttempt {
                payment_request,
                max_fee_sat,
                outgoing_chan_id,
            },
            cancel,
        )
    }

    /// Starts closing `channel_point`. Only the initial request is awaited;
    /// progress arrives on the returned handles. If `cancel` fires before
    /// the node answers, the handles never yield.
    pub async fn close_channel(
        &self,
        cancel: CancellationToken,
        channel_point: ChannelPoint,
        force: bool,
    ) -> Result<CloseChannelHandles, LnClientError> {
        info!("Closing channel {channel_point} (force: {force})");

        let request = CloseChannelRequest {
            channel_point,
            force,
        };
        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Close of {channel_point} cancelled before the node answered");
                return Ok(CloseChannelHandles::abandoned());
            }
            stream = self.rpc.close_channel(request) => stream?,
        };

        Ok(CloseUpdateRelay::spawn(
            channel_point,
            stream,
            cancel,
            self.dispatcher.tracker(),
        ))
    }

    /// Opens a channel to `peer` and returns its funding outpoint once the
    /// funding transaction is published.
    pub async fn open_channel(
        &self,
        peer: &PublicKey,
        local_funding_sat: u64,
        push_sat: u64,
    ) -> Result<ChannelPoint, LnClientError> {
        info!("Opening channel to {peer} with {local_funding_sat} sat (push {push_sat} sat)");
        self.rpc
            .open_channel(OpenChannelRequest {
                peer: *peer,
                local_funding_sat,
                push_sat,
            })
            .await
    }

    /// Waits for all dispatched payments and running close relays to finish.
    pub async fn wait_for_finished(&self) {
        self.dispatcher.wait_for_finished().await
    }

    pub async fn get_info(&self) -> Result<NodeInfo, LnClientError> {
        self.rpc.get_info().await
    }

    pub async fn confirmed_wallet_balance(&self) -> Result<u64, LnClientError> {
        self.rpc.confirmed_wallet_balance().await
    }

    pub async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LnClientError> {
        self.rpc.list_channels().await
    }

    pub async fn add_invoice(
        &self,
        amount_msat: Option<u64>,
        description: InvoiceDescription<'_>,
        expiry_secs: Option<u64>,
    ) -> Result<AddedInvoice, LnClientError> {
        self.rpc
            .add_invoice(amount_msat, description, expiry_secs)
            .await
    }

    pub async fn connect_peer(&self, peer: &PublicKey, host: &str) -> Result<(), LnClientError> {
        self.rpc.connect_peer(peer, host).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::test_utils::test_invoice;
    use crate::rpc::mock::{MockCloseChannel, MockLnRpcClient, MockSendPayment};
    use crate::rpc::{CloseStatus, RouteTotals, SendPaymentResponse};
    use breakwater_service_api::channel::CloseUpdate;
    use lightning_invoice::Currency;
    use std::str::FromStr;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::timeout;

    fn point() -> ChannelPoint {
        ChannelPoint::from_str(
            "2222222222222222222222222222222222222222222222222222222222222222:1",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pay_invoice_when_settled_then_result_on_handle() {
        let client = LightningClient::new(
            MockLnRpcClient::with_send_payment([MockSendPayment::Respond(SendPaymentResponse {
                payment_error: String::new(),
                payment_preimage: vec![3u8; 32],
                route: Some(RouteTotals {
                    total_fees_msat: 2_000,
                    total_amt_msat: 52_000,
                }),
            })]),
            Network::Regtest,
            PaymentPollConfig::default(),
        );

        let rx = client.pay_invoice(
            CancellationToken::new(),
            test_invoice(Currency::Regtest, Some(50_000)),
            5,
            None,
        );
        client.wait_for_finished().await;

        let paid = rx.await.unwrap().unwrap();
        assert_eq!(paid.paid_fee_msat, 2_000);
        assert_eq!(paid.paid_amount_msat, 50_000);
        assert_eq!(client.rpc().send_payment_count(), 1);
    }

    #[tokio::test]
    async fn pay_invoice_when_wrong_network_then_rejected() {
        let client = LightningClient::new(
            MockLnRpcClient::default(),
            Network::Mainnet,
            PaymentPollConfig::default(),
        );

        let rx = client.pay_invoice(
            CancellationToken::new(),
            test_invoice(Currency::Regtest, Some(50_000)),
            5,
            None,
        );

        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            crate::payment::error::PaymentError::NetworkMismatch {
                client: Network::Mainnet,
                ..
            }
        ));
        assert_eq!(client.rpc().send_payment_count(), 0);
    }

    #[tokio::test]
    async fn close_channel_when_feed_ends_then_relays_updates() {
        let txid = [0x5au8; 32];
        let client = LightningClient::new(
            MockLnRpcClient::with_close_channel(MockCloseChannel {
                events: vec![
                    Ok(CloseStatus::Pending {
                        txid: txid.to_vec(),
                    }),
                    Ok(CloseStatus::Closed {
                        closing_txid: txid.to_vec(),
                    }),
                ],
                hold_open: false,
            }),
            Network::Regtest,
            PaymentPollConfig::default(),
        );

        let mut handles = client
            .close_channel(CancellationToken::new(), point(), false)
            .await
            .unwrap();

        let mut updates = Vec::new();
        while let Some(update) = handles.updates.recv().await {
            updates.push(update);
        }

        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], CloseUpdate::PendingClose { .. }));
        assert!(matches!(updates[1], CloseUpdate::ChannelClosed { .. }));
        assert!(handles.errors.recv().await.is_none());
        assert_eq!(client.rpc().close_channel_count(), 1);
    }

    #[tokio::test]
    async fn close_channel_when_cancelled_before_answer_then_abandoned_handles() {
        let client = LightningClient::new(
            MockLnRpcClient::default(),
            Network::Regtest,
            PaymentPollConfig::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut handles = timeout(
            Duration::from_secs(5),
            client.close_channel(cancel, point(), true),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(handles.updates.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(handles.errors.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn wait_for_finished_when_relay_live_then_waits_until_cancelled() {
        let client = LightningClient::new(
            MockLnRpcClient::with_close_channel(MockCloseChannel {
                events: vec![],
                hold_open: true,
            }),
            Network::Regtest,
            PaymentPollConfig::default(),
        );
        let cancel = CancellationToken::new();

        let mut handles = client
            .close_channel(cancel.clone(), point(), false)
            .await
            .unwrap();

        assert!(timeout(Duration::from_millis(200), client.wait_for_finished()).await.is_err());

        cancel.cancel();
        timeout(Duration::from_secs(5), client.wait_for_finished())
            .await
            .unwrap();

        assert_eq!(handles.updates.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(handles.errors.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn open_channel_when_node_accepts_then_funding_outpoint() {
        let peer = PublicKey::from_str(
            "02eec7245d6b7d2ccb30380bfbe2a3648cd7a942653f5aa340edcea1f283686619",
        )
        .unwrap();
        let client = LightningClient::new(
            MockLnRpcClient::with_open_channel(Ok(point())),
            Network::Regtest,
            PaymentPollConfig::default(),
        );

        let opened = client.open_channel(&peer, 100_000, 1_000).await.unwrap();

        assert_eq!(opened, point());
        assert_eq!(
            client.rpc().open_channel_calls(),
            vec![OpenChannelRequest {
                peer,
                local_funding_sat: 100_000,
                push_sat: 1_000,
            }]
        );
    }
}
