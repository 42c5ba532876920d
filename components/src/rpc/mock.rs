use crate::rpc::error::LnClientError;
use crate::rpc::{
    CloseChannelRequest, CloseStatus, CloseStatusStream, LnRpcClient, OpenChannelRequest,
    SendPaymentRequest, SendPaymentResponse,
};
use async_trait::async_trait;
use breakwater_service_api::channel::{ChannelInfo, ChannelPoint};
use breakwater_service_api::invoice::{AddedInvoice, InvoiceDescription};
use breakwater_service_api::node::NodeInfo;
use futures_util::stream::{self, StreamExt};
use secp256k1::PublicKey;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub enum MockSendPayment {
    Respond(SendPaymentResponse),
    RespondAfter(Duration, SendPaymentResponse),
    Fail(LnClientError),
    /// never returns; only cancellation ends the call
    Hang,
}

#[derive(Default)]
pub struct MockLnRpcClient {
    send_payment_script: Mutex<VecDeque<MockSendPayment>>,
    send_payment_calls: Mutex<Vec<(Instant, SendPaymentRequest)>>,
    close_channel_script: Mutex<Option<MockCloseChannel>>,
    close_channel_calls: AtomicUsize,
    open_channel_result: Mutex<Option<Result<ChannelPoint, LnClientError>>>,
    open_channel_calls: Mutex<Vec<OpenChannelRequest>>,
}

pub struct MockCloseChannel {
    pub events: Vec<Result<CloseStatus, LnClientError>>,
    /// keep the feed open after the scripted events instead of ending it
    pub hold_open: bool,
}

impl MockLnRpcClient {
    pub fn with_send_payment<I: IntoIterator<Item = MockSendPayment>>(script: I) -> Self {
        Self {
            send_payment_script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_close_channel(script: MockCloseChannel) -> Self {
        Self {
            close_channel_script: Mutex::new(Some(script)),
            ..Default::default()
        }
    }

    pub fn with_open_channel(result: Result<ChannelPoint, LnClientError>) -> Self {
        Self {
            open_channel_result: Mutex::new(Some(result)),
            ..Default::default()
        }
    }

    pub fn send_payment_count(&self) -> usize {
        self.send_payment_calls.lock().unwrap().len()
    }

    pub fn send_payment_calls(&self) -> Vec<(Instant, SendPaymentRequest)> {
        self.send_payment_calls.lock().unwrap().clone()
    }

    pub fn close_channel_count(&self) -> usize {
        self.close_channel_calls.load(Ordering::SeqCst)
    }

    pub fn open_channel_calls(&self) -> Vec<OpenChannelRequest> {
        self.open_channel_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LnRpcClient for MockLnRpcClient {
    async fn send_payment(
        &self,
        request: SendPaymentRequest,
    ) -> Result<SendPaymentResponse, LnClientError> {
        self.send_payment_calls
            .lock()
            .unwrap()
            .push((Instant::now(), request));

        let next = self.send_payment_script.lock().unwrap().pop_front();
        match next {
            Some(MockSendPayment::Respond(response)) => Ok(response),
            Some(MockSendPayment::RespondAfter(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(MockSendPayment::Fail(e)) => Err(e),
            Some(MockSendPayment::Hang) | None => std::future::pending().await,
        }
    }

    async fn close_channel(
        &self,
        _request: CloseChannelRequest,
    ) -> Result<CloseStatusStream, LnClientError> {
        self.close_channel_calls.fetch_add(1, Ordering::SeqCst);

        // no script means the node never answers
        let next = self.close_channel_script.lock().unwrap().take();
        let Some(script) = next else {
            return std::future::pending().await;
        };

        let events = stream::iter(script.events);
        if script.hold_open {
            Ok(events.chain(stream::pending()).boxed())
        } else {
            Ok(events.boxed())
        }
    }

    async fn get_info(&self) -> Result<NodeInfo, LnClientError> {
        unimplemented!("get_info is not used by the mock")
    }

    async fn confirmed_wallet_balance(&self) -> Result<u64, LnClientError> {
        unimplemented!("confirmed_wallet_balance is not used by the mock")
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LnClientError> {
        unimplemented!("list_channels is not used by the mock")
    }

    async fn add_invoice<'a>(
        &self,
        _amount_msat: Option<u64>,
        _description: InvoiceDescription<'a>,
        _expiry_secs: Option<u64>,
    ) -> Result<AddedInvoice, LnClientError> {
        unimplemented!("add_invoice is not used by the mock")
    }

    async fn connect_peer(&self, _peer: &PublicKey, _host: &str) -> Result<(), LnClientError> {
        unimplemented!("connect_peer is not used by the mock")
    }

    async fn open_channel(
        &self,
        request: OpenChannelRequest,
    ) -> Result<ChannelPoint, LnClientError> {
        self.open_channel_calls.lock().unwrap().push(request);

        let next = self.open_channel_result.lock().unwrap().take();
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}
