use crate::payment::classify::{classify, PaymentOutcome};
use crate::payment::decode::decode_payment_request;
use crate::payment::error::PaymentError;
use crate::payment::{PaymentAttempt, PaymentPollConfig, PaymentResult};
use crate::rpc::{LnRpcClient, SendPaymentRequest};
use breakwater_service_api::network::Network;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Drives a single payment to a terminal outcome.
///
/// A submission that finds an earlier attempt for the same hash still in
/// flight is repeated after the poll interval until that attempt settles
/// or fails.
pub struct PaymentResolver<R> {
    rpc: Arc<R>,
    network: Network,
    poll: PaymentPollConfig,
}

impl<R> PaymentResolver<R>
where
    R: LnRpcClient + Send + Sync,
{
    pub fn new(rpc: Arc<R>, network: Network, poll: PaymentPollConfig) -> Self {
        Self { rpc, network, poll }
    }

    /// Returns `None` if `cancel` fires first; the caller has gone away and
    /// nothing is reported.
    pub async fn resolve(
        &self,
        attempt: PaymentAttempt,
        cancel: &CancellationToken,
    ) -> Option<PaymentResult> {
        let decoded = match decode_payment_request(&attempt.payment_request, self.network) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Payment request rejected: {e}");
                return Some(Err(e));
            }
        };
        let hash = decoded.payment_hash;

        let mut attempts = 0u32;
        loop {
            attempts += 1;

            let request = SendPaymentRequest {
                payment_request: attempt.payment_request.clone(),
                fee_limit_sat: attempt.max_fee_sat,
                outgoing_chan_id: attempt.outgoing_chan_id,
            };

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Payment {hash} abandoned while submitting");
                    return None;
                }
                response = self.rpc.send_payment(request) => response,
            };

            let response = match response {
                Ok(response) => response,
                Err(e) if e.is_cancelled() => {
                    debug!("Payment {hash} submission cancelled");
                    return None;
                }
                Err(e) => {
                    warn!("Payment {hash} failed: {e}");
                    return Some(Err(PaymentError::Rpc(e)));
                }
            };

            match classify(response, decoded.amount_msat) {
                PaymentOutcome::Final(Ok(paid)) => {
                    if paid.preimage.is_some() {
                        info!("Payment {hash} completed");
                    } else {
                        info!("Payment {hash} already completed");
                    }
                    return Some(Ok(paid));
                }
                PaymentOutcome::Final(Err(e)) => {
                    warn!("Payment {hash} failed: {e}");
                    return Some(Err(e));
                }
                PaymentOutcome::InFlight => {
                    info!("Payment {hash} already in flight");

                    if let Some(max) = self.poll.max_poll_attempts {
                        if attempts >= max {
                            warn!("Payment {hash} still in flight after {attempts} attempts");
                            return Some(Err(PaymentError::StillInFlight { attempts }));
                        }
                    }

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("Payment {hash} abandoned while polling");
                            return None;
                        }
                        _ = tokio::time::sleep(self.poll.poll_interval) => {}
                    }
                }
            }
        }
    }
}
