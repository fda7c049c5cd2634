//! HTTP handlers for billing, payment and webhook endpoints.
//!
//! These handlers connect Axum routes to the application layer handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::{
    BillingRunSettings, CreateDonationCommand, CreateDonationHandler, DownloadInvoiceHandler,
    DownloadInvoiceQuery, InitiateInvoicePaymentCommand, InitiateInvoicePaymentHandler,
    ReconcileCallbackCommand, ReconcileDonationCallbackHandler, ReconcileInvoiceCallbackHandler,
    ReconcileOutcome, RunBillingCycleCommand, RunBillingCycleHandler,
};
use crate::domain::billing::BillingError;
use crate::domain::foundation::InvoiceId;
use crate::ports::{
    DonationRepository, InvoiceRenderer, InvoiceRepository, LogoSource, Mailer, PaymentGateway,
    ProfileReader, SubscriptionRepository,
};

use super::dto::{
    BillingRunResponse, CronQuery, DonationRequest, DonationResponse, InvoicePushRequest,
    PushResponse, WebhookAck,
};
use super::error::BillingApiError;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the billing endpoints.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct BillingAppState {
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub donations: Arc<dyn DonationRepository>,
    pub profiles: Arc<dyn ProfileReader>,
    pub renderer: Arc<dyn InvoiceRenderer>,
    pub logo: Arc<dyn LogoSource>,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub settings: BillingRunSettings,
    /// Shared secret the scheduler trigger must present. Empty means unset.
    pub cron_secret: Arc<SecretString>,
}

impl BillingAppState {
    pub fn run_billing_cycle_handler(&self) -> RunBillingCycleHandler {
        RunBillingCycleHandler::new(
            self.subscriptions.clone(),
            self.invoices.clone(),
            self.renderer.clone(),
            self.logo.clone(),
            self.mailer.clone(),
            self.settings.clone(),
        )
    }

    pub fn initiate_invoice_payment_handler(&self) -> InitiateInvoicePaymentHandler {
        InitiateInvoicePaymentHandler::new(
            self.invoices.clone(),
            self.profiles.clone(),
            self.gateway.clone(),
        )
    }

    pub fn create_donation_handler(&self) -> CreateDonationHandler {
        CreateDonationHandler::new(self.donations.clone(), self.gateway.clone())
    }

    pub fn reconcile_invoice_handler(&self) -> ReconcileInvoiceCallbackHandler {
        ReconcileInvoiceCallbackHandler::new(
            self.invoices.clone(),
            self.profiles.clone(),
            self.mailer.clone(),
            self.settings.company_name.clone(),
        )
    }

    pub fn reconcile_donation_handler(&self) -> ReconcileDonationCallbackHandler {
        ReconcileDonationCallbackHandler::new(self.donations.clone())
    }

    pub fn download_invoice_handler(&self) -> DownloadInvoiceHandler {
        DownloadInvoiceHandler::new(
            self.invoices.clone(),
            self.profiles.clone(),
            self.renderer.clone(),
            self.logo.clone(),
        )
    }

    fn authorize_cron(&self, provided: Option<&str>) -> Result<(), BillingApiError> {
        let expected = self.cron_secret.expose_secret();
        if expected.is_empty() {
            return Err(BillingError::configuration("cron secret is not configured").into());
        }
        let provided = provided.unwrap_or_default();
        if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(BillingApiError::Unauthorized)
        }
    }
}

fn parse_invoice_id(raw: &str) -> Result<InvoiceId, BillingApiError> {
    InvoiceId::from_str(raw)
        .map_err(|_| BillingApiError::from(BillingError::validation("invoice_id", "must be a UUID")))
}

// ════════════════════════════════════════════════════════════════════════════════
// Scheduler
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/cron/billing?secret=...
pub async fn run_billing_cycle(
    State(state): State<BillingAppState>,
    Query(query): Query<CronQuery>,
) -> Result<Json<BillingRunResponse>, BillingApiError> {
    state.authorize_cron(query.secret.as_deref())?;

    let summary = state
        .run_billing_cycle_handler()
        .handle(RunBillingCycleCommand { now: Utc::now() })
        .await?;

    Ok(Json(summary.into()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/invoices/{id}/push
pub async fn push_invoice_payment(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Path(invoice_id): Path<String>,
    Json(request): Json<InvoicePushRequest>,
) -> Result<Json<PushResponse>, BillingApiError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;

    let push = state
        .initiate_invoice_payment_handler()
        .handle(InitiateInvoicePaymentCommand {
            invoice_id,
            phone: request.phone,
            user,
        })
        .await?;

    Ok(Json(push.into()))
}

/// POST /api/donations
pub async fn create_donation(
    State(state): State<BillingAppState>,
    Json(request): Json<DonationRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .create_donation_handler()
        .handle(CreateDonationCommand {
            name: request.name,
            phone: request.phone,
            amount: request.amount,
            now: Utc::now(),
        })
        .await?;

    let status = if result.push.accepted {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(DonationResponse::from(result))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/mpesa/invoices
///
/// Always answers 200 once the body is JSON so the gateway stops retrying.
pub async fn invoice_callback(State(state): State<BillingAppState>, body: Bytes) -> Response {
    let Some(payload) = parse_callback_body(&body) else {
        return invalid_json();
    };
    let result = state
        .reconcile_invoice_handler()
        .handle(ReconcileCallbackCommand {
            payload,
            received_at: Utc::now(),
        })
        .await;
    acknowledge("invoice", result)
}

/// POST /api/webhooks/mpesa/donations
pub async fn donation_callback(State(state): State<BillingAppState>, body: Bytes) -> Response {
    let Some(payload) = parse_callback_body(&body) else {
        return invalid_json();
    };
    let result = state
        .reconcile_donation_handler()
        .handle(ReconcileCallbackCommand {
            payload,
            received_at: Utc::now(),
        })
        .await;
    acknowledge("donation", result)
}

fn parse_callback_body(body: &[u8]) -> Option<serde_json::Value> {
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "M-Pesa callback body is not JSON");
            None
        }
    }
}

fn invalid_json() -> Response {
    (StatusCode::BAD_REQUEST, Json(WebhookAck::new("invalid_json"))).into_response()
}

fn acknowledge(flow: &'static str, result: Result<ReconcileOutcome, BillingError>) -> Response {
    let ack = match result {
        Ok(outcome) => {
            tracing::info!(flow, outcome = %outcome, "M-Pesa callback reconciled");
            WebhookAck::new(outcome.as_str())
        }
        Err(e) => {
            tracing::error!(flow, code = %e.code(), error = %e.detail(), "M-Pesa callback processing failed");
            WebhookAck::new("error")
        }
    };
    (StatusCode::OK, Json(ack)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoice download
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/invoices/{id}/download
pub async fn download_invoice(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Path(invoice_id): Path<String>,
) -> Result<Response, BillingApiError> {
    let invoice_id = parse_invoice_id(&invoice_id)?;

    let file = state
        .download_invoice_handler()
        .handle(DownloadInvoiceQuery { invoice_id, user })
        .await?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
