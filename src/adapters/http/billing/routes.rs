//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_donation, donation_callback, download_invoice, health, invoice_callback,
    push_invoice_payment, run_billing_cycle, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## Scheduler (shared secret)
/// - `GET /api/cron/billing?secret=...` - Generate invoices for due subscriptions
///
/// ## User Endpoints (require authentication)
/// - `POST /api/payments/invoices/{id}/push` - Start an STK push for an invoice
/// - `GET /api/invoices/{id}/download` - Download the invoice PDF
///
/// ## Public Endpoints
/// - `POST /api/donations` - Start a donation push
/// - `GET /health` - Liveness
///
/// ## Webhook Endpoints (no auth)
/// - `POST /api/webhooks/mpesa/invoices` - Invoice payment callbacks
/// - `POST /api/webhooks/mpesa/donations` - Donation payment callbacks
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/api/cron/billing", get(run_billing_cycle))
        .route("/api/payments/invoices/:id/push", post(push_invoice_payment))
        .route("/api/invoices/:id/download", get(download_invoice))
        .route("/api/donations", post(create_donation))
        .route("/api/webhooks/mpesa/invoices", post(invoice_callback))
        .route("/api/webhooks/mpesa/donations", post(donation_callback))
        .route("/health", get(health))
}

/// Billing router with its state applied.
pub fn billing_router(state: BillingAppState) -> Router {
    billing_routes().with_state(state)
}
