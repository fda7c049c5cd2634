//! Fixtures shared by handler tests.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::adapters::email::RecordingMailer;
use crate::adapters::memory::InMemoryBillingStore;
use crate::adapters::mpesa::MockPaymentGateway;
use crate::domain::billing::{
    AccountHolder, BillingCycle, Invoice, InvoiceNumber, Plan, Subscription, SubscriptionStatus,
};
use crate::domain::foundation::{PlanId, Role, SubscriptionId, UserId};
use crate::ports::{InvoiceDocument, InvoiceRenderer, LogoImage};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn plan(price: i64, cycle: BillingCycle, currency: Option<&str>) -> Plan {
    Plan {
        id: PlanId::new(),
        name: "Growth Retainer".to_string(),
        price: Decimal::from(price),
        billing_cycle: cycle,
        currency: currency.map(str::to_string),
    }
}

pub fn profile(role: Role) -> AccountHolder {
    AccountHolder {
        id: UserId::new(),
        full_name: Some("Jane Client".to_string()),
        email: Some("jane@client.test".to_string()),
        role,
    }
}

pub fn subscription(account: &UserId, plan: &PlanId, next: NaiveDate) -> Subscription {
    Subscription {
        id: SubscriptionId::new(),
        account_id: *account,
        plan_id: *plan,
        custom_price: None,
        next_billing_date: next,
        status: SubscriptionStatus::Active,
    }
}

pub fn pending_invoice(account: &UserId, amount: i64) -> Invoice {
    Invoice::new(
        None,
        *account,
        InvoiceNumber::from_parts(2024, 42),
        Decimal::from(amount),
        "KES",
        date(2024, 1, 2),
        date(2024, 1, 2).and_hms_opt(6, 0, 0).unwrap().and_utc(),
    )
    .unwrap()
}

/// Renderer that records what it was asked to draw.
#[derive(Default)]
pub struct RecordingRenderer {
    documents: Mutex<Vec<(InvoiceDocument, bool)>>,
}

impl RecordingRenderer {
    pub fn documents(&self) -> Vec<InvoiceDocument> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|(doc, _)| doc.clone())
            .collect()
    }

    pub fn logo_flags(&self) -> Vec<bool> {
        self.documents.lock().unwrap().iter().map(|(_, l)| *l).collect()
    }
}

impl InvoiceRenderer for RecordingRenderer {
    fn render(&self, document: &InvoiceDocument, logo: Option<&LogoImage>) -> Vec<u8> {
        self.documents
            .lock()
            .unwrap()
            .push((document.clone(), logo.is_some()));
        format!("%PDF {}", document.invoice_number).into_bytes()
    }
}

/// The adapters most handler tests wire together.
pub struct Harness {
    pub store: Arc<InMemoryBillingStore>,
    pub gateway: Arc<MockPaymentGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub renderer: Arc<RecordingRenderer>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryBillingStore::new()),
            gateway: Arc::new(MockPaymentGateway::new()),
            mailer: Arc::new(RecordingMailer::new()),
            renderer: Arc::new(RecordingRenderer::default()),
        }
    }
}
