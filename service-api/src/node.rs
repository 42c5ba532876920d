use crate::network::Network;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub block_height: u32,
    pub identity_public_key: PublicKey,
    pub alias: String,
    pub network: Network,
    pub uris: Vec<String>,
    /// wallet view matches the main chain
    pub synced_to_chain: bool,
    /// local view of the public channel graph is complete
    pub synced_to_graph: bool,
}
