use crate::commands::{cli_write_json, connect};
use crate::config::CliConfig;
use anyhow::{anyhow, Context};
use breakwater_service_api::invoice::InvoiceDescription;
use log::warn;
use secp256k1::PublicKey;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;

pub async fn info(config: &CliConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let client = connect(config)?;
    let info = client.get_info().await.with_context(|| "getting node info")?;
    if info.network != client.network() {
        warn!(
            "node reports network {}, configuration says {}",
            info.network,
            client.network()
        );
    }
    cli_write_json(output, &info)
}

pub async fn balance(config: &CliConfig, output: Option<&Path>) -> anyhow::Result<()> {
    let client = connect(config)?;
    let confirmed = client
        .confirmed_wallet_balance()
        .await
        .with_context(|| "getting wallet balance")?;
    cli_write_json(output, &json!({ "confirmedBalanceSat": confirmed }))
}

pub async fn invoice(
    config: &CliConfig,
    amount_msat: Option<u64>,
    memo: Option<&str>,
    hash_memo: bool,
    description_hash: Option<&str>,
    expiry_secs: Option<u64>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let hash_bytes = description_hash.map(parse_description_hash).transpose()?;
    let description = invoice_description(memo, hash_memo, hash_bytes.as_ref())?;

    let client = connect(config)?;
    let added = client
        .add_invoice(amount_msat, description, expiry_secs)
        .await
        .with_context(|| "adding invoice")?;
    cli_write_json(output, &added)
}

pub async fn connect_peer(config: &CliConfig, peer: &str, host: &str) -> anyhow::Result<()> {
    let peer =
        PublicKey::from_str(peer).with_context(|| format!("parsing peer public key '{peer}'"))?;
    let client = connect(config)?;
    client
        .connect_peer(&peer, host)
        .await
        .with_context(|| format!("connecting to {peer}@{host}"))
}

fn invoice_description<'a>(
    memo: Option<&'a str>,
    hash_memo: bool,
    description_hash: Option<&'a [u8; 32]>,
) -> anyhow::Result<InvoiceDescription<'a>> {
    match (memo, description_hash, hash_memo) {
        (Some(_), Some(_), _) => Err(anyhow!(
            "a memo and a description hash cannot both be given"
        )),
        (None, _, true) => Err(anyhow!("hashing the memo needs a memo")),
        (None, Some(hash), false) => Ok(InvoiceDescription::Hash(hash)),
        (Some(memo), None, true) => Ok(InvoiceDescription::DirectIntoHash(memo)),
        (memo, None, false) => Ok(InvoiceDescription::Direct(memo.unwrap_or_default())),
    }
}

fn parse_description_hash(hash: &str) -> anyhow::Result<[u8; 32]> {
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(hash, &mut bytes)
        .with_context(|| format!("parsing description hash '{hash}'"))?;
    Ok(bytes)
}
