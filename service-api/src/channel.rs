pub use bitcoin_hashes::sha256d::Hash as Txid;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;

/// Funding outpoint of a channel, written `<txid>:<output index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPoint {
    pub txid: Txid,
    pub output_index: u32,
}

impl FromStr for ChannelPoint {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, output_index) = s.split_once(':').ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("channel point '{s}' is not of the form <txid>:<index>"),
            )
        })?;

        let txid = Txid::from_str(txid).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid txid in channel point '{s}': {e}"),
            )
        })?;

        let output_index = output_index.parse::<u32>().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid output index in channel point '{s}': {e}"),
            )
        })?;

        Ok(Self { txid, output_index })
    }
}

impl fmt::Display for ChannelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.output_index)
    }
}

/// Progress of a cooperative or force close, in the order the node reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum CloseUpdate {
    /// The closing transaction has been broadcast.
    PendingClose { txid: Txid },
    /// The closing transaction confirmed on chain.
    ChannelClosed { txid: Txid },
}

impl CloseUpdate {
    pub fn close_txid(&self) -> &Txid {
        match self {
            CloseUpdate::PendingClose { txid } => txid,
            CloseUpdate::ChannelClosed { txid } => txid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_point: String,
    pub active: bool,
    pub channel_id: u64,
    pub remote_public_key: PublicKey,
    pub capacity_sat: u64,
    pub local_balance_sat: u64,
    pub remote_balance_sat: u64,
    pub initiator: bool,
    pub private: bool,
}
