use serde::{Deserialize, Serialize};
use std::fmt;

/// Bitcoin network the backing node runs on. Payment requests for any other
/// network are rejected before they reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Simnet,
    Signet,
}

impl Network {
    pub fn from_lnd_chain_network(network: &str) -> Option<Self> {
        match network {
            "mainnet" => Some(Network::Mainnet),
            "testnet" | "testnet3" | "testnet4" => Some(Network::Testnet),
            "regtest" => Some(Network::Regtest),
            "simnet" => Some(Network::Simnet),
            "signet" => Some(Network::Signet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Regtest => write!(f, "regtest"),
            Network::Simnet => write!(f, "simnet"),
            Network::Signet => write!(f, "signet"),
        }
    }
}
