use crate::payment::error::PaymentError;
use crate::payment::PaymentResult;
use crate::rpc::SendPaymentResponse;
use breakwater_service_api::payment::{PaidPayment, Preimage};

/// Payment error text LND reports for a settled payment.
pub const PAYMENT_RESULT_SUCCESS: &str = "";

/// Payment error text LND reports when an earlier attempt already settled
/// the invoice.
pub const PAYMENT_RESULT_ALREADY_PAID: &str = "invoice is already paid";

/// Payment error text LND reports when an earlier attempt for the same hash
/// is still unresolved.
pub const PAYMENT_RESULT_IN_FLIGHT: &str = "payment is in transition";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    Success,
    AlreadyPaid,
    InFlight,
    Failure(String),
}

impl OutcomeClass {
    pub fn from_code(code: &str) -> Self {
        match code {
            PAYMENT_RESULT_SUCCESS => OutcomeClass::Success,
            PAYMENT_RESULT_ALREADY_PAID => OutcomeClass::AlreadyPaid,
            PAYMENT_RESULT_IN_FLIGHT => OutcomeClass::InFlight,
            other => OutcomeClass::Failure(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum PaymentOutcome {
    Final(PaymentResult),
    InFlight,
}

/// Turns one submission response into either a terminal result or a request
/// to poll again.
///
/// An already-paid invoice carries no route, so it is reported with a zero
/// fee and the invoice's own amount.
pub fn classify(response: SendPaymentResponse, requested_amount_msat: u64) -> PaymentOutcome {
    match OutcomeClass::from_code(&response.payment_error) {
        OutcomeClass::Success => PaymentOutcome::Final(settled(response)),
        OutcomeClass::AlreadyPaid => PaymentOutcome::Final(Ok(already_paid(requested_amount_msat))),
        OutcomeClass::InFlight => PaymentOutcome::InFlight,
        OutcomeClass::Failure(message) => PaymentOutcome::Final(Err(PaymentError::Remote(message))),
    }
}

pub fn already_paid(requested_amount_msat: u64) -> PaidPayment {
    PaidPayment {
        preimage: None,
        paid_fee_msat: 0,
        paid_amount_msat: requested_amount_msat,
    }
}

fn settled(response: SendPaymentResponse) -> PaymentResult {
    let preimage =
        Preimage::from_slice(&response.payment_preimage).map_err(PaymentError::MalformedPreimage)?;

    let route = response
        .route
        .ok_or_else(|| PaymentError::MalformedResponse("missing payment route".to_string()))?;

    Ok(PaidPayment {
        preimage: Some(preimage),
        paid_fee_msat: route.total_fees_msat,
        paid_amount_msat: route.total_amt_msat.saturating_sub(route.total_fees_msat),
    })
}
