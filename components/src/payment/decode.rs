use crate::payment::error::PaymentError;
use bitcoin_hashes::sha256;
use breakwater_service_api::network::Network;
use lightning_invoice::{Bolt11Invoice, Currency};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPaymentRequest {
    pub payment_hash: sha256::Hash,
    pub amount_msat: u64,
    pub destination: String,
}

/// Decodes a BOLT 11 payment request for `network`.
///
/// Requests without an amount, or with a zero amount, are rejected: the
/// amount is what an already-settled payment gets reported as.
pub fn decode_payment_request(
    payment_request: &str,
    network: Network,
) -> Result<DecodedPaymentRequest, PaymentError> {
    let invoice = Bolt11Invoice::from_str(payment_request)
        .map_err(|e| PaymentError::InvoiceDecode(e.to_string()))?;

    let currency = invoice.currency();
    if currency != currency_for(network) {
        return Err(PaymentError::NetworkMismatch {
            invoice: format!("{currency:?}"),
            client: network,
        });
    }

    let amount_msat = match invoice.amount_milli_satoshis() {
        None | Some(0) => return Err(PaymentError::NoAmount),
        Some(amount_msat) => amount_msat,
    };

    Ok(DecodedPaymentRequest {
        payment_hash: *invoice.payment_hash(),
        amount_msat,
        destination: invoice.get_payee_pub_key().to_string(),
    })
}

fn currency_for(network: Network) -> Currency {
    match network {
        Network::Mainnet => Currency::Bitcoin,
        Network::Testnet => Currency::BitcoinTestnet,
        Network::Regtest => Currency::Regtest,
        Network::Simnet => Currency::Simnet,
        Network::Signet => Currency::Signet,
    }
}
