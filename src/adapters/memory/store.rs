//! In-memory billing store for tests and local development.
//!
//! Implements every store port over one shared set of tables so a test can
//! seed subscriptions, plans and profiles, drive a handler, and assert on
//! the resulting rows.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::billing::{
    AccountHolder, DueSubscription, Invoice, InvoiceNumber, PaymentCorrelation, PaymentReceipt,
    Plan, Subscription,
};
use crate::domain::foundation::{
    DomainError, DonationId, ErrorCode, InvoiceId, PlanId, SubscriptionId, UserId,
};
use crate::domain::payment::{Donation, DonationStatus};
use crate::ports::{
    DonationRepository, InvoiceDetail, InvoiceRepository, ProfileReader, SubscriptionRepository,
};

#[derive(Default)]
struct Tables {
    subscriptions: Vec<Subscription>,
    plans: HashMap<PlanId, Plan>,
    profiles: HashMap<UserId, AccountHolder>,
    invoices: Vec<Invoice>,
    donations: Vec<Donation>,
}

#[derive(Default)]
struct Faults {
    fail_listing: bool,
    fail_invoice_create_for: HashSet<UserId>,
    fail_attach_checkout: bool,
    fail_profile_lookup: bool,
    fail_checkout_lookup: bool,
    fail_settlement: bool,
}

/// In-memory implementation of the store ports.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned.
#[derive(Default)]
pub struct InMemoryBillingStore {
    tables: RwLock<Tables>,
    faults: RwLock<Faults>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().expect("InMemoryBillingStore: lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().expect("InMemoryBillingStore: lock poisoned")
    }

    fn faults(&self) -> std::sync::RwLockReadGuard<'_, Faults> {
        self.faults.read().expect("InMemoryBillingStore: faults lock poisoned")
    }

    fn faults_mut(&self) -> std::sync::RwLockWriteGuard<'_, Faults> {
        self.faults.write().expect("InMemoryBillingStore: faults lock poisoned")
    }

    // === Seeding ===

    pub fn insert_plan(&self, plan: Plan) {
        self.write().plans.insert(plan.id, plan);
    }

    pub fn insert_profile(&self, profile: AccountHolder) {
        self.write().profiles.insert(profile.id, profile);
    }

    pub fn insert_subscription(&self, subscription: Subscription) {
        self.write().subscriptions.push(subscription);
    }

    pub fn insert_invoice(&self, invoice: Invoice) {
        self.write().invoices.push(invoice);
    }

    pub fn insert_donation(&self, donation: Donation) {
        self.write().donations.push(donation);
    }

    // === Fault injection ===

    /// Makes `list_due` fail.
    pub fn fail_listing(&self) {
        self.faults_mut().fail_listing = true;
    }

    /// Makes invoice inserts for this account fail.
    pub fn fail_invoice_create_for(&self, account_id: UserId) {
        self.faults_mut().fail_invoice_create_for.insert(account_id);
    }

    /// Makes correlation id writes fail.
    pub fn fail_attach_checkout(&self) {
        self.faults_mut().fail_attach_checkout = true;
    }

    /// Makes profile lookups fail.
    pub fn fail_profile_lookup(&self) {
        self.faults_mut().fail_profile_lookup = true;
    }

    /// Makes invoice and donation lookups by checkout request id fail.
    pub fn fail_checkout_lookup(&self) {
        self.faults_mut().fail_checkout_lookup = true;
    }

    /// Makes the conditional paid/success/failed writes fail.
    pub fn fail_settlement(&self) {
        self.faults_mut().fail_settlement = true;
    }

    // === Inspection ===

    pub fn invoices(&self) -> Vec<Invoice> {
        self.read().invoices.clone()
    }

    pub fn donations(&self) -> Vec<Donation> {
        self.read().donations.clone()
    }

    pub fn subscription(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.read().subscriptions.iter().find(|s| &s.id == id).cloned()
    }

    pub fn invoice(&self, id: &InvoiceId) -> Option<Invoice> {
        self.read().invoices.iter().find(|i| &i.id == id).cloned()
    }

    pub fn donation(&self, id: &DonationId) -> Option<Donation> {
        self.read().donations.iter().find(|d| &d.id == id).cloned()
    }
}

fn db_error(message: &str) -> DomainError {
    DomainError::database(format!("Simulated failure: {}", message))
}

fn duplicate_checkout(checkout_request_id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DuplicateCheckoutRequest,
        format!("Checkout request id already recorded: {}", checkout_request_id),
    )
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn list_due(&self, today: NaiveDate) -> Result<Vec<DueSubscription>, DomainError> {
        if self.faults().fail_listing {
            return Err(db_error("list_due"));
        }
        let tables = self.read();
        let mut due: Vec<DueSubscription> = tables
            .subscriptions
            .iter()
            .filter(|s| s.is_due(today))
            .map(|s| DueSubscription {
                subscription: s.clone(),
                plan: tables.plans.get(&s.plan_id).cloned(),
                account: tables.profiles.get(&s.account_id).cloned(),
            })
            .collect();
        due.sort_by_key(|d| d.subscription.next_billing_date);
        Ok(due)
    }

    async fn advance_next_billing_date(
        &self,
        id: &SubscriptionId,
        next: NaiveDate,
    ) -> Result<(), DomainError> {
        let mut tables = self.write();
        let sub = tables
            .subscriptions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::SubscriptionNotFound, format!("Subscription not found: {}", id)))?;
        sub.next_billing_date = next;
        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryBillingStore {
    async fn create(&self, invoice: &Invoice) -> Result<(), DomainError> {
        if self.faults().fail_invoice_create_for.contains(&invoice.account_id) {
            return Err(db_error("create invoice"));
        }
        let mut tables = self.write();
        if tables
            .invoices
            .iter()
            .any(|i| i.invoice_number == invoice.invoice_number)
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateInvoiceNumber,
                format!("Invoice number already used: {}", invoice.invoice_number),
            ));
        }
        tables.invoices.push(invoice.clone());
        Ok(())
    }

    async fn number_exists(&self, number: &InvoiceNumber) -> Result<bool, DomainError> {
        Ok(self.read().invoices.iter().any(|i| &i.invoice_number == number))
    }

    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoice(id))
    }

    async fn find_detail(&self, id: &InvoiceId) -> Result<Option<InvoiceDetail>, DomainError> {
        let tables = self.read();
        let Some(invoice) = tables.invoices.iter().find(|i| &i.id == id).cloned() else {
            return Ok(None);
        };
        let plan = invoice
            .subscription_id
            .and_then(|sid| tables.subscriptions.iter().find(|s| s.id == sid))
            .and_then(|s| tables.plans.get(&s.plan_id))
            .cloned();
        let account = tables.profiles.get(&invoice.account_id).cloned();
        Ok(Some(InvoiceDetail {
            invoice,
            plan,
            account,
        }))
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        if self.faults().fail_checkout_lookup {
            return Err(db_error("invoice checkout lookup"));
        }
        Ok(self
            .read()
            .invoices
            .iter()
            .find(|i| i.checkout_request_id.as_deref() == Some(checkout_request_id))
            .cloned())
    }

    async fn attach_checkout(
        &self,
        id: &InvoiceId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError> {
        if self.faults().fail_attach_checkout {
            return Err(db_error("attach_checkout"));
        }
        let mut tables = self.write();
        if tables.invoices.iter().any(|i| {
            &i.id != id && i.checkout_request_id.as_deref() == Some(correlation.checkout_request_id.as_str())
        }) {
            return Err(duplicate_checkout(&correlation.checkout_request_id));
        }
        let invoice = tables
            .invoices
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, format!("Invoice not found: {}", id)))?;
        invoice
            .attach_checkout(correlation.clone())
            .map_err(DomainError::from)
    }

    async fn mark_paid(&self, id: &InvoiceId, receipt: &PaymentReceipt) -> Result<bool, DomainError> {
        if self.faults().fail_settlement {
            return Err(db_error("mark_paid"));
        }
        let mut tables = self.write();
        match tables.invoices.iter_mut().find(|i| &i.id == id) {
            Some(invoice) if invoice.status.is_payable() => {
                invoice.mark_paid(receipt.clone()).map_err(DomainError::from)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DonationRepository for InMemoryBillingStore {
    async fn create(&self, donation: &Donation) -> Result<(), DomainError> {
        self.write().donations.push(donation.clone());
        Ok(())
    }

    async fn attach_checkout(
        &self,
        id: &DonationId,
        correlation: &PaymentCorrelation,
    ) -> Result<(), DomainError> {
        if self.faults().fail_attach_checkout {
            return Err(db_error("attach_checkout"));
        }
        let mut tables = self.write();
        if tables.donations.iter().any(|d| {
            &d.id != id && d.checkout_request_id.as_deref() == Some(correlation.checkout_request_id.as_str())
        }) {
            return Err(duplicate_checkout(&correlation.checkout_request_id));
        }
        let donation = tables
            .donations
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::DonationNotFound, format!("Donation not found: {}", id)))?;
        donation.attach_checkout(correlation.clone());
        Ok(())
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Donation>, DomainError> {
        if self.faults().fail_checkout_lookup {
            return Err(db_error("donation checkout lookup"));
        }
        Ok(self
            .read()
            .donations
            .iter()
            .find(|d| d.checkout_request_id.as_deref() == Some(checkout_request_id))
            .cloned())
    }

    async fn mark_success(
        &self,
        id: &DonationId,
        receipt: &PaymentReceipt,
    ) -> Result<bool, DomainError> {
        if self.faults().fail_settlement {
            return Err(db_error("mark_success"));
        }
        let mut tables = self.write();
        match tables.donations.iter_mut().find(|d| &d.id == id) {
            Some(donation) if donation.status == DonationStatus::Pending => {
                donation.mark_success(receipt.clone()).map_err(DomainError::from)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: &DonationId) -> Result<bool, DomainError> {
        if self.faults().fail_settlement {
            return Err(db_error("mark_failed"));
        }
        let mut tables = self.write();
        match tables.donations.iter_mut().find(|d| &d.id == id) {
            Some(donation) if donation.status == DonationStatus::Pending => {
                donation.mark_failed().map_err(DomainError::from)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ProfileReader for InMemoryBillingStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<AccountHolder>, DomainError> {
        if self.faults().fail_profile_lookup {
            return Err(db_error("profile lookup"));
        }
        Ok(self.read().profiles.get(id).cloned())
    }
}
