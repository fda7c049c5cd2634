//! M-Pesa payment gateway adapters.
//!
//! - `gateway` - Daraja STK push over HTTPS
//! - `mock` - In-process gateway for tests

mod gateway;
mod mock;

pub use gateway::{MpesaGateway, MpesaGatewayConfig};
pub use mock::MockPaymentGateway;
