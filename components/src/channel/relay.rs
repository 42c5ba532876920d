use crate::rpc::error::LnClientError;
use crate::rpc::{CloseStatus, CloseStatusStream};
use bitcoin_hashes::Hash;
use breakwater_service_api::channel::{ChannelPoint, CloseUpdate, Txid};
use futures_util::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Caller side of a channel close in progress.
///
/// Both receivers close together when the node ends the update feed, and
/// only then. A failure is yielded once on `errors`; after a failure or a
/// cancellation nothing more arrives and both receivers stay open until the
/// caller drops them.
#[derive(Debug)]
pub struct CloseChannelHandles {
    pub updates: mpsc::Receiver<CloseUpdate>,
    pub errors: mpsc::Receiver<LnClientError>,
}

impl CloseChannelHandles {
    /// Handles for a close that was cancelled before the node answered.
    /// They never yield.
    pub fn abandoned() -> Self {
        let (update_tx, updates) = mpsc::channel(1);
        let (error_tx, errors) = mpsc::channel(1);
        hold_open(update_tx, error_tx);
        Self { updates, errors }
    }
}

pub struct CloseUpdateRelay {
    channel_point: ChannelPoint,
    stream: CloseStatusStream,
    update_tx: mpsc::Sender<CloseUpdate>,
    error_tx: mpsc::Sender<LnClientError>,
    cancel: CancellationToken,
}

impl CloseUpdateRelay {
    /// Spawns a task on `tracker` forwarding `stream` and returns the
    /// caller's handles. The task ends at end of stream, on failure, or on
    /// cancellation.
    pub fn spawn(
        channel_point: ChannelPoint,
        stream: CloseStatusStream,
        cancel: CancellationToken,
        tracker: &TaskTracker,
    ) -> CloseChannelHandles {
        let (update_tx, updates) = mpsc::channel(1);
        let (error_tx, errors) = mpsc::channel(1);

        let relay = Self {
            channel_point,
            stream,
            update_tx,
            error_tx,
            cancel,
        };
        tracker.spawn(relay.run());

        CloseChannelHandles { updates, errors }
    }

    async fn run(mut self) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.abandon(),
                next = self.stream.next() => next,
            };

            let status = match next {
                None => {
                    debug!("Close updates for {} finished", self.channel_point);
                    return;
                }
                Some(Err(e)) => return self.fail(e).await,
                Some(Ok(status)) => status,
            };

            let update = match self.decode(status) {
                Ok(update) => update,
                Err(e) => return self.fail(e).await,
            };

            debug!("Close of {}: {update:?}", self.channel_point);
            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.abandon(),
                sent = self.update_tx.send(update) => sent,
            };
            if sent.is_err() {
                debug!("Close updates for {} no longer read", self.channel_point);
                return;
            }
        }
    }

    fn decode(&self, status: CloseStatus) -> Result<CloseUpdate, LnClientError> {
        match status {
            CloseStatus::Pending { txid } => Ok(CloseUpdate::PendingClose {
                txid: self.txid(&txid)?,
            }),
            CloseStatus::Closed { closing_txid } => Ok(CloseUpdate::ChannelClosed {
                txid: self.txid(&closing_txid)?,
            }),
            CloseStatus::Unrecognized(update) => Err(LnClientError::from_unknown_close_update(
                update,
                format!("closing channel {}", self.channel_point),
            )),
        }
    }

    fn txid(&self, bytes: &[u8]) -> Result<Txid, LnClientError> {
        Txid::from_slice(bytes).map_err(|e| {
            LnClientError::from_malformed_response(
                format!("close txid {}: {e}", hex::encode(bytes)),
                format!("closing channel {}", self.channel_point),
            )
        })
    }

    async fn fail(self, e: LnClientError) {
        warn!("Close of {} failed: {e}", self.channel_point);

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return self.abandon(),
            sent = self.error_tx.send(e) => sent,
        };
        if sent.is_ok() {
            hold_open(self.update_tx, self.error_tx);
        }
    }

    fn abandon(self) {
        debug!("Close of {} cancelled", self.channel_point);
        hold_open(self.update_tx, self.error_tx);
    }
}

/// Keeps both senders alive until the caller drops the receivers, so the
/// handles never read as a completed close.
fn hold_open(update_tx: mpsc::Sender<CloseUpdate>, error_tx: mpsc::Sender<LnClientError>) {
    tokio::spawn(async move {
        tokio::join!(update_tx.closed(), error_tx.closed());
    });
}
