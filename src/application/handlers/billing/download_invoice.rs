//! DownloadInvoiceHandler - Renders a stored invoice for its owner or an admin.

use std::sync::Arc;

use crate::application::handlers::access::authorize_invoice_access;
use crate::domain::billing::{BillingCycle, BillingError};
use crate::domain::foundation::{AuthenticatedUser, InvoiceId};
use crate::ports::{InvoiceDocument, InvoiceRenderer, InvoiceRepository, LogoSource, ProfileReader};

use super::notifications::invoice_filename;

/// Query for one invoice document.
#[derive(Debug, Clone)]
pub struct DownloadInvoiceQuery {
    pub invoice_id: InvoiceId,
    pub user: AuthenticatedUser,
}

/// A rendered invoice ready to stream back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct DownloadInvoiceHandler {
    invoices: Arc<dyn InvoiceRepository>,
    profiles: Arc<dyn ProfileReader>,
    renderer: Arc<dyn InvoiceRenderer>,
    logo: Arc<dyn LogoSource>,
}

impl DownloadInvoiceHandler {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        profiles: Arc<dyn ProfileReader>,
        renderer: Arc<dyn InvoiceRenderer>,
        logo: Arc<dyn LogoSource>,
    ) -> Self {
        Self {
            invoices,
            profiles,
            renderer,
            logo,
        }
    }

    pub async fn handle(&self, query: DownloadInvoiceQuery) -> Result<InvoiceFile, BillingError> {
        let detail = self
            .invoices
            .find_detail(&query.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("invoice", query.invoice_id))?;

        authorize_invoice_access(self.profiles.as_ref(), &query.user, &detail.invoice).await?;

        let invoice = &detail.invoice;
        let (recipient_name, recipient_email) = match &detail.account {
            Some(account) => (
                account.display_name().to_string(),
                account.contact_email().unwrap_or_default().to_string(),
            ),
            None => ("Customer".to_string(), String::new()),
        };
        let (plan_name, billing_cycle) = match &detail.plan {
            Some(plan) => (plan.name.clone(), plan.billing_cycle.clone()),
            None => ("Subscription".to_string(), BillingCycle::Monthly),
        };

        let document = InvoiceDocument {
            invoice_number: invoice.invoice_number.clone(),
            date: invoice.created_at.date_naive(),
            status: invoice.status.as_str().to_string(),
            recipient_name,
            recipient_email,
            plan_name,
            amount: invoice.amount(),
            currency: invoice.currency.clone(),
            billing_cycle,
        };

        let logo = match self.logo.fetch().await {
            Ok(logo) => Some(logo),
            Err(e) => {
                tracing::debug!(error = %e, "Rendering invoice without logo");
                None
            }
        };

        tracing::info!(invoice_id = %invoice.id, user_id = %query.user.id, "Invoice downloaded");
        Ok(InvoiceFile {
            filename: invoice_filename(invoice.invoice_number.as_str()),
            content_type: self.renderer.content_type(),
            bytes: self.renderer.render(&document, logo.as_ref()),
        })
    }
}
