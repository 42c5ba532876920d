use crate::commands::{cli_write_json, connect};
use crate::config::CliConfig;
use crate::signals::cancel_on_signal;
use anyhow::{anyhow, Context};
use log::{info, warn};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub async fn pay(
    config: &CliConfig,
    invoice: String,
    max_fee_sat: u64,
    outgoing_chan_id: Option<u64>,
    timeout_secs: Option<f64>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let deadline = timeout_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .with_context(|| "invalid payment timeout")?;

    let client = connect(config)?;
    let cancel = CancellationToken::new();
    let signals_handle = cancel_on_signal(cancel.clone())?;

    info!("paying invoice with max fee {max_fee_sat} sat");
    let result_rx = client.pay_invoice(cancel.clone(), invoice, max_fee_sat, outgoing_chan_id);

    let deadline_fut = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    let outcome = tokio::select! {
        result = result_rx => result.ok(),
        _ = deadline_fut => {
            warn!("payment did not resolve in time, abandoning");
            None
        }
    };

    cancel.cancel();
    info!("waiting for outstanding payments");
    client.wait_for_finished().await;
    signals_handle.close();

    match outcome {
        Some(Ok(paid)) => cli_write_json(output, &paid),
        Some(Err(e)) => Err(e).with_context(|| "paying invoice"),
        None => Err(anyhow!("payment abandoned before it resolved")),
    }
}
