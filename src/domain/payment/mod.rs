//! Payment domain: push flows, donations and gateway callbacks.

mod callback;
mod donation;
mod flow;
mod phone;

pub use callback::{
    format_gateway_timestamp, parse_gateway_timestamp, CallbackItem, CallbackMetadata,
    CallbackOutcome, StkCallback, SuccessfulPayment, GATEWAY_UTC_OFFSET_SECS, RESULT_CODE_SUCCESS,
};
pub use donation::{Donation, DonationStatus};
pub use flow::{PaymentFlow, TransactionType};
pub use phone::PhoneNumber;
