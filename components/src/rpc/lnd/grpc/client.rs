use crate::rpc::error::{LnClientError, LnClientErrorSourceKind};
use crate::rpc::lnd::grpc::config::{LndGrpcClientAuth, LndGrpcClientConfig};
use crate::rpc::{
    CloseChannelRequest, CloseStatus, CloseStatusStream, LnRpcClient, OpenChannelRequest,
    RouteTotals, SendPaymentRequest, SendPaymentResponse,
};
use async_trait::async_trait;
use bitcoin_hashes::{sha256, Hash};
use breakwater_service_api::channel::{ChannelInfo, ChannelPoint, Txid};
use breakwater_service_api::invoice::{AddedInvoice, InvoiceDescription};
use breakwater_service_api::network::Network;
use breakwater_service_api::node::NodeInfo;
use breakwater_service_api::service::ServiceErrorSource;
use fedimint_tonic_lnd::lnrpc::{
    channel_point, close_status_update, fee_limit, ConnectPeerRequest, FeeLimit,
    GetInfoRequest, Invoice, LightningAddress, ListChannelsRequest, SendRequest,
    WalletBalanceRequest,
};
pub use fedimint_tonic_lnd::tonic;
use fedimint_tonic_lnd::{connect, Client};
use futures_util::StreamExt;
use secp256k1::PublicKey;
use sha2::Digest;
use std::borrow::Cow;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use url::Url;

pub struct LndGrpcClient {
    timeout: Duration,
    config: LndGrpcClientConfig,
    inner: Arc<Mutex<Option<Arc<InnerLndGrpcClient>>>>,
}

impl LndGrpcClient {
    pub fn create(timeout: Duration, config: LndGrpcClientConfig) -> Self {
        Self {
            timeout,
            config,
            inner: Arc::new(Default::default()),
        }
    }

    async fn inner_connect(&self) -> Result<Arc<InnerLndGrpcClient>, LnClientError> {
        let mut inner = self.inner.lock().await;
        match inner.as_ref() {
            None => {
                let inner_connect =
                    Arc::new(InnerLndGrpcClient::connect(self.timeout, &self.config).await?);
                *inner = Some(inner_connect.clone());
                Ok(inner_connect)
            }
            Some(inner) => Ok(inner.clone()),
        }
    }

    async fn inner_disconnect(&self) {
        let mut inner = self.inner.lock().await;
        *inner = None;
    }

    fn is_connection_error(e: &LnClientError) -> bool {
        match e.source() {
            LnClientErrorSourceKind::TonicError(_) => !e.is_cancelled(),
            LnClientErrorSourceKind::Timeout => true,
            _ => false,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, f: F) -> Result<T, LnClientError>
    where
        F: Future<Output = Result<T, LnClientError>>,
    {
        let r = match timeout(self.timeout, f).await {
            Ok(r) => r,
            Err(_) => Err(LnClientError::from_timeout_error(
                ServiceErrorSource::Upstream,
                format!("LND {operation} on {}", self.config.url),
            )),
        };
        if r.as_ref().err().is_some_and(Self::is_connection_error) {
            self.inner_disconnect().await;
        }
        r
    }
}

#[async_trait]
impl LnRpcClient for LndGrpcClient {
    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, LnClientError> {
        let inner = self.inner_connect().await?;

        // settlement has no upper bound, so no timeout here
        let r = inner.send_payment(request).await;
        if r.as_ref().err().is_some_and(Self::is_connection_error) {
            self.inner_disconnect().await;
        }
        r
    }

    async fn close_channel(
        &self,
        request: CloseChannelRequest,
    ) -> Result<CloseStatusStream, LnClientError> {
        let inner = self.inner_connect().await?;

        let r = inner.close_channel(request).await;
        if r.as_ref().err().is_some_and(Self::is_connection_error) {
            self.inner_disconnect().await;
        }
        r
    }

    async fn get_info(&self) -> Result<NodeInfo, LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded("get info", inner.get_info()).await
    }

    async fn confirmed_wallet_balance(&self) -> Result<u64, LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded("wallet balance", inner.confirmed_wallet_balance())
            .await
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded("list channels", inner.list_channels()).await
    }

    async fn add_invoice<'a>(
        &self,
        amount_msat: Option<u64>,
        description: InvoiceDescription<'a>,
        expiry_secs: Option<u64>,
    ) -> Result<AddedInvoice, LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded(
            "add invoice",
            inner.add_invoice(amount_msat, description, expiry_secs),
        )
        .await
    }

    async fn connect_peer(&self, peer: &PublicKey, host: &str) -> Result<(), LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded("connect peer", inner.connect_peer(peer, host))
            .await
    }

    async fn open_channel(
        &self,
        request: OpenChannelRequest,
    ) -> Result<ChannelPoint, LnClientError> {
        let inner = self.inner_connect().await?;
        self.bounded("open channel", inner.open_channel(request))
            .await
    }
}

/// LND takes amounts as signed integers.
fn lnd_amount<C: Into<Cow<'static, str>>>(
    amount: u64,
    field: &str,
    context: C,
) -> Result<i64, LnClientError> {
    i64::try_from(amount).map_err(|_| {
        LnClientError::from_invalid_request(format!("{field} {amount} is out of range"), context)
    })
}

fn channel_point_from_lnd(
    point: fedimint_tonic_lnd::lnrpc::ChannelPoint,
) -> Result<ChannelPoint, String> {
    let txid = match point.funding_txid {
        Some(channel_point::FundingTxid::FundingTxidBytes(bytes)) => Txid::from_slice(&bytes)
            .map_err(|e| format!("funding txid {}: {e}", hex::encode(&bytes)))?,
        Some(channel_point::FundingTxid::FundingTxidStr(txid)) => {
            Txid::from_str(&txid).map_err(|e| format!("funding txid '{txid}': {e}"))?
        }
        None => return Err("missing funding txid".to_string()),
    };

    Ok(ChannelPoint {
        txid,
        output_index: point.output_index,
    })
}

struct InnerLndGrpcClient {
    client: Client,
    url: Url,
}

impl InnerLndGrpcClient {
    async fn connect(
        timeout_d: Duration,
        config: &LndGrpcClientConfig,
    ) -> Result<Self, LnClientError> {
        let LndGrpcClientAuth::Path(auth) = &config.auth;
        let url = config.url.clone();

        let client = timeout(
            timeout_d,
            connect(
                url.as_str().to_string(),
                &auth.tls_cert_path,
                &auth.macaroon_path,
            ),
        )
        .await
        .map_err(|_| {
            LnClientError::from_timeout_error(
                ServiceErrorSource::Upstream,
                format!("connecting LND client to {url}"),
            )
        })?
        .map_err(|e| {
            LnClientError::from_connect_error(
                e,
                ServiceErrorSource::Upstream,
                format!("connecting LND client to {url}"),
            )
        })?;

        Ok(Self { client, url })
    }

    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, LnClientError> {
        let fee_limit_sat = lnd_amount(
            request.fee_limit_sat,
            "fee limit",
            format!("LND send payment on {}", self.url),
        )?;
        let send_request = SendRequest {
            payment_request: request.payment_request,
            fee_limit: Some(FeeLimit {
                limit: Some(fee_limit::Limit::Fixed(fee_limit_sat)),
            }),
            outgoing_chan_id: request.outgoing_chan_id.unwrap_or_default(),
            ..Default::default()
        };

        let response = self
            .client
            .clone()
            .lightning()
            .send_payment_sync(send_request)
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(
                    e,
                    format!("LND send payment on {}", self.url),
                )
            })?
            .into_inner();

        let route = response.payment_route.map(|route| RouteTotals {
            total_fees_msat: route.total_fees_msat.max(0) as u64,
            total_amt_msat: route.total_amt_msat.max(0) as u64,
        });

        Ok(SendPaymentResponse {
            payment_error: response.payment_error,
            payment_preimage: response.payment_preimage,
            route,
        })
    }

    async fn close_channel(
        &self,
        request: CloseChannelRequest,
    ) -> Result<CloseStatusStream, LnClientError> {
        let point = request.channel_point;
        let close_request = fedimint_tonic_lnd::lnrpc::CloseChannelRequest {
            channel_point: Some(fedimint_tonic_lnd::lnrpc::ChannelPoint {
                funding_txid: Some(channel_point::FundingTxid::FundingTxidBytes(
                    point.txid.to_byte_array().to_vec(),
                )),
                output_index: point.output_index,
            }),
            force: request.force,
            ..Default::default()
        };

        let stream = self
            .client
            .clone()
            .lightning()
            .close_channel(close_request)
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(
                    e,
                    format!("LND close channel {point} on {}", self.url),
                )
            })?
            .into_inner();

        let url = self.url.clone();
        let stream = stream.map(move |update| match update {
            Ok(update) => Ok(match update.update {
                Some(close_status_update::Update::ClosePending(pending)) => {
                    CloseStatus::Pending { txid: pending.txid }
                }
                Some(close_status_update::Update::ChanClose(closed)) => CloseStatus::Closed {
                    closing_txid: closed.closing_txid,
                },
                other => CloseStatus::Unrecognized(format!("{other:?}")),
            }),
            Err(e) => Err(LnClientError::from_tonic_error(
                e,
                format!("LND receiving close updates for {point} on {url}"),
            )),
        });

        Ok(stream.boxed())
    }

    async fn get_info(&self) -> Result<NodeInfo, LnClientError> {
        let response = self
            .client
            .clone()
            .lightning()
            .get_info(GetInfoRequest::default())
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(e, format!("LND get info on {}", self.url))
            })?
            .into_inner();

        let identity_public_key = PublicKey::from_str(&response.identity_pubkey).map_err(|e| {
            LnClientError::from_malformed_response(
                format!("identity pubkey '{}': {e}", response.identity_pubkey),
                format!("LND get info on {}", self.url),
            )
        })?;

        let network = response
            .chains
            .first()
            .and_then(|chain| Network::from_lnd_chain_network(&chain.network))
            .ok_or_else(|| {
                LnClientError::from_malformed_response(
                    format!("unknown chain network in {:?}", response.chains),
                    format!("LND get info on {}", self.url),
                )
            })?;

        Ok(NodeInfo {
            block_height: response.block_height,
            identity_public_key,
            alias: response.alias,
            network,
            uris: response.uris,
            synced_to_chain: response.synced_to_chain,
            synced_to_graph: response.synced_to_graph,
        })
    }

    async fn confirmed_wallet_balance(&self) -> Result<u64, LnClientError> {
        let response = self
            .client
            .clone()
            .lightning()
            .wallet_balance(WalletBalanceRequest::default())
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(e, format!("LND wallet balance on {}", self.url))
            })?
            .into_inner();

        Ok(response.confirmed_balance.max(0) as u64)
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LnClientError> {
        let response = self
            .client
            .clone()
            .lightning()
            .list_channels(ListChannelsRequest::default())
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(e, format!("LND list channels on {}", self.url))
            })?
            .into_inner();

        response
            .channels
            .into_iter()
            .map(|channel| {
                let remote_public_key =
                    PublicKey::from_str(&channel.remote_pubkey).map_err(|e| {
                        LnClientError::from_malformed_response(
                            format!("remote pubkey '{}': {e}", channel.remote_pubkey),
                            format!("LND list channels on {}", self.url),
                        )
                    })?;

                Ok(ChannelInfo {
                    channel_point: channel.channel_point,
                    active: channel.active,
                    channel_id: channel.chan_id,
                    remote_public_key,
                    capacity_sat: channel.capacity.max(0) as u64,
                    local_balance_sat: channel.local_balance.max(0) as u64,
                    remote_balance_sat: channel.remote_balance.max(0) as u64,
                    initiator: channel.initiator,
                    private: channel.private,
                })
            })
            .collect()
    }

    async fn add_invoice<'a>(
        &self,
        amount_msat: Option<u64>,
        description: InvoiceDescription<'a>,
        expiry_secs: Option<u64>,
    ) -> Result<AddedInvoice, LnClientError> {
        let (memo, description_hash) = match description {
            InvoiceDescription::Direct(d) => (d.to_string(), Default::default()),
            InvoiceDescription::DirectIntoHash(d) => (
                Default::default(),
                sha2::Sha256::digest(d.as_bytes()).to_vec(),
            ),
            InvoiceDescription::Hash(h) => (Default::default(), h.to_vec()),
        };

        let invoice_request = Invoice {
            memo,
            value_msat: amount_msat.map_or_else(Default::default, |ms| ms as i64),
            description_hash,
            expiry: expiry_secs.map_or_else(Default::default, |n| n as i64),
            ..Default::default()
        };

        let response = self
            .client
            .clone()
            .lightning()
            .add_invoice(invoice_request)
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(e, format!("LND add invoice on {}", self.url))
            })?
            .into_inner();

        let payment_hash = sha256::Hash::from_slice(&response.r_hash).map_err(|e| {
            LnClientError::from_malformed_response(
                format!("payment hash {}: {e}", hex::encode(&response.r_hash)),
                format!("LND add invoice on {}", self.url),
            )
        })?;

        Ok(AddedInvoice {
            payment_hash,
            payment_request: response.payment_request,
        })
    }

    async fn connect_peer(&self, peer: &PublicKey, host: &str) -> Result<(), LnClientError> {
        let request = ConnectPeerRequest {
            addr: Some(LightningAddress {
                pubkey: peer.to_string(),
                host: host.to_string(),
            }),
            ..Default::default()
        };

        self.client
            .clone()
            .lightning()
            .connect_peer(request)
            .await
            .map_err(|e| {
                LnClientError::from_tonic_error(
                    e,
                    format!("LND connect peer {peer}@{host} on {}", self.url),
                )
            })?;

        Ok(())
    }

    async fn open_channel(
        &self,
        request: OpenChannelRequest,
    ) -> Result<ChannelPoint, LnClientError> {
        let context = format!("LND open channel to {} on {}", request.peer, self.url);

        let open_request = fedimint_tonic_lnd::lnrpc::OpenChannelRequest {
            node_pubkey: request.peer.serialize().to_vec(),
            local_funding_amount: lnd_amount(
                request.local_funding_sat,
                "local funding amount",
                context.clone(),
            )?,
            push_sat: lnd_amount(request.push_sat, "push amount", context.clone())?,
            ..Default::default()
        };

        let point = self
            .client
            .clone()
            .lightning()
            .open_channel_sync(open_request)
            .await
            .map_err(|e| LnClientError::from_tonic_error(e, context.clone()))?
            .into_inner();

        channel_point_from_lnd(point)
            .map_err(|e| LnClientError::from_malformed_response(e, context))
    }
}
