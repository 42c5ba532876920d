use futures_util::stream::StreamExt;
use log::info;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::iterator::Handle;
use signal_hook::low_level::signal_name;
use signal_hook_tokio::Signals;
use std::future::Future;
use std::io;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub fn get_signals_fut() -> io::Result<(Pin<Box<impl Future<Output = Option<i32>> + Sized>>, Handle)>
{
    let signals = Signals::new(TERM_SIGNALS)?;
    let handle = signals.handle();
    Ok((
        Box::pin(async move {
            let mut signals_stream = signals.fuse();
            signals_stream.next().await
        }),
        handle,
    ))
}

/// Cancels `cancel` on the first termination signal. The returned handle
/// must be closed once the command is done.
pub fn cancel_on_signal(cancel: CancellationToken) -> io::Result<Handle> {
    let (signals_fut, signals_handle) = get_signals_fut()?;
    tokio::spawn(async move {
        if let Some(signal) = signals_fut.await {
            let signal_str = signal_name(signal).unwrap_or("unknown");
            info!("received signal: {signal_str}, cancelling");
            cancel.cancel();
        }
    });
    Ok(signals_handle)
}
