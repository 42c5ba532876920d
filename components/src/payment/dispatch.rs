use crate::payment::resolve::PaymentResolver;
use crate::payment::{PaymentAttempt, PaymentResult};
use crate::rpc::LnRpcClient;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Runs payments in the background and keeps count of the ones still
/// outstanding so shutdown can wait for them. Other background work, such
/// as close relays, joins the same count through [`Self::tracker`].
pub struct PaymentDispatcher<R> {
    resolver: Arc<PaymentResolver<R>>,
    tracker: TaskTracker,
    draining: Mutex<()>,
}

impl<R> PaymentDispatcher<R>
where
    R: LnRpcClient + Send + Sync + 'static,
{
    pub fn new(resolver: PaymentResolver<R>) -> Self {
        Self {
            resolver: Arc::new(resolver),
            tracker: TaskTracker::new(),
            draining: Mutex::new(()),
        }
    }

    /// Starts `attempt` and returns at once. The receiver yields exactly one
    /// result, or is dropped without one if `cancel` fires before the
    /// payment resolves.
    pub fn dispatch(
        &self,
        attempt: PaymentAttempt,
        cancel: CancellationToken,
    ) -> oneshot::Receiver<PaymentResult> {
        let (tx, rx) = oneshot::channel();
        let resolver = self.resolver.clone();

        self.tracker.spawn(async move {
            if let Some(result) = resolver.resolve(attempt, &cancel).await {
                // a caller that stopped listening loses the result
                let _ = tx.send(result);
            }
        });

        rx
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for every tracked task to finish. Payments may still be
    /// dispatched afterwards.
    pub async fn wait_for_finished(&self) {
        // one drain at a time, or a reopen can land between another
        // drainer's close and wait
        let _guard = self.draining.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
