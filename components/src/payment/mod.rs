pub mod classify;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod resolve;
#[cfg(test)]
pub(crate) mod test_utils;

use crate::payment::error::PaymentError;
use breakwater_service_api::payment::PaidPayment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type PaymentResult = Result<PaidPayment, PaymentError>;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// One request to pay a BOLT 11 invoice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub payment_request: String,
    pub max_fee_sat: u64,
    pub outgoing_chan_id: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaymentPollConfig {
    #[serde(with = "duration_secs", rename = "poll-interval-secs")]
    pub poll_interval: Duration,
    /// Unbounded when absent.
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
}

impl Default for PaymentPollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: None,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
