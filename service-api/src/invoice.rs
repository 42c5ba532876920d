use bitcoin_hashes::sha256;
use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Ord, PartialOrd)]
pub enum InvoiceDescription<'a> {
    Direct(&'a str),
    DirectIntoHash(&'a str),
    Hash(&'a [u8; 32]),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedInvoice {
    pub payment_hash: sha256::Hash,
    pub payment_request: String,
}
