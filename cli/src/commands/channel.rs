use crate::commands::{cli_write_json, connect};
use crate::config::CliConfig;
use crate::signals::cancel_on_signal;
use anyhow::{anyhow, Context};
use breakwater_service_api::channel::{ChannelPoint, CloseUpdate};
use log::info;
use secp256k1::PublicKey;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

pub async fn close_channel(
    config: &CliConfig,
    channel_point: &str,
    force: bool,
) -> anyhow::Result<()> {
    let channel_point = ChannelPoint::from_str(channel_point)
        .with_context(|| format!("parsing channel point '{channel_point}'"))?;

    let client = connect(config)?;
    let cancel = CancellationToken::new();
    let signals_handle = cancel_on_signal(cancel.clone())?;

    let mut handles = client
        .close_channel(cancel.clone(), channel_point, force)
        .await
        .with_context(|| format!("closing channel {channel_point}"))?;

    let result = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                break Err(anyhow!("close of {channel_point} cancelled"));
            }
            update = handles.updates.recv() => match update {
                Some(update) => {
                    if let CloseUpdate::ChannelClosed { txid } = &update {
                        info!("channel {channel_point} closed in {txid}");
                    }
                    if let Err(e) = cli_write_json(None::<&Path>, &update) {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
            Some(e) = handles.errors.recv() => {
                break Err(e).with_context(|| format!("closing channel {channel_point}"));
            }
        }
    };

    cancel.cancel();
    signals_handle.close();
    result
}

pub async fn open_channel(
    config: &CliConfig,
    peer: &str,
    local_sat: u64,
    push_sat: u64,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let peer =
        PublicKey::from_str(peer).with_context(|| format!("parsing peer public key '{peer}'"))?;
    if push_sat > local_sat {
        return Err(anyhow!(
            "push amount {push_sat} sat exceeds local funding {local_sat} sat"
        ));
    }

    let client = connect(config)?;
    let channel_point = client
        .open_channel(&peer, local_sat, push_sat)
        .await
        .with_context(|| format!("opening channel to {peer}"))?;
    info!("channel {channel_point} funded");
    cli_write_json(output, &json!({ "channelPoint": channel_point.to_string() }))
}

pub async fn list_channels(config: &CliConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let client = connect(config)?;
    let channels = client
        .list_channels()
        .await
        .with_context(|| "listing channels")?;
    cli_write_json(output, &channels)
}
