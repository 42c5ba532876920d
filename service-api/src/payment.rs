use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io;

pub const PREIMAGE_LEN: usize = 32;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Preimage([u8; PREIMAGE_LEN]);

impl Preimage {
    pub fn from_slice(bytes: &[u8]) -> io::Result<Self> {
        let bytes: [u8; PREIMAGE_LEN] = bytes.try_into().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid preimage length: {} bytes", bytes.len()),
            )
        })?;
        Ok(Self(bytes))
    }

    pub fn from_hex(hex_str: &str) -> io::Result<Self> {
        let bytes =
            hex::decode(hex_str).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PREIMAGE_LEN] {
        &self.0
    }
}

impl fmt::Display for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Preimage({self})")
    }
}

impl Serialize for Preimage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Preimage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Preimage::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A settled payment.
///
/// `preimage` is `None` when the node reported the invoice as paid by an
/// earlier attempt: LND returns neither the route nor the preimage in that
/// case, so the fee is reported as zero and the amount is the invoice amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidPayment {
    pub preimage: Option<Preimage>,
    pub paid_fee_msat: u64,
    pub paid_amount_msat: u64,
}
