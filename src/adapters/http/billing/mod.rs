//! HTTP adapter for billing and payment endpoints.
//!
//! - `GET /api/cron/billing` - Billing run trigger
//! - `POST /api/payments/invoices/{id}/push` - Invoice STK push
//! - `POST /api/donations` - Donation STK push
//! - `POST /api/webhooks/mpesa/{invoices,donations}` - Gateway callbacks
//! - `GET /api/invoices/{id}/download` - Invoice PDF

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use error::BillingApiError;
pub use handlers::BillingAppState;
pub use routes::{billing_router, billing_routes};
