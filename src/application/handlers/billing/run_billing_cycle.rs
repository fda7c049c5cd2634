//! RunBillingCycleHandler - Generates invoices for every due subscription.
//!
//! Subscriptions are processed one at a time. A failure on one subscription
//! is logged and counted and never stops the run; only a failure to list
//! due subscriptions fails the whole run.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::domain::billing::{BillingError, DueSubscription, Invoice, InvoiceNumber, InvoiceStatus};
use crate::ports::{
    InvoiceDocument, InvoiceRenderer, InvoiceRepository, LogoImage, LogoSource, Mailer,
    SubscriptionRepository,
};

use super::notifications::invoice_email;

/// Command to run one billing pass.
#[derive(Debug, Clone)]
pub struct RunBillingCycleCommand {
    pub now: DateTime<Utc>,
}

/// Counts reported back to the trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BillingRunSummary {
    pub generated: u32,
    pub errors: u32,
}

/// Settings for a billing run.
#[derive(Debug, Clone)]
pub struct BillingRunSettings {
    /// Signature name in invoice emails.
    pub company_name: String,
    /// How many random invoice numbers to try before giving up.
    pub invoice_number_attempts: u32,
}

impl Default for BillingRunSettings {
    fn default() -> Self {
        Self {
            company_name: "Consultancy".to_string(),
            invoice_number_attempts: 5,
        }
    }
}

/// Handler for the periodic billing run.
pub struct RunBillingCycleHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    renderer: Arc<dyn InvoiceRenderer>,
    logo: Arc<dyn LogoSource>,
    mailer: Arc<dyn Mailer>,
    settings: BillingRunSettings,
}

impl RunBillingCycleHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        renderer: Arc<dyn InvoiceRenderer>,
        logo: Arc<dyn LogoSource>,
        mailer: Arc<dyn Mailer>,
        settings: BillingRunSettings,
    ) -> Self {
        Self {
            subscriptions,
            invoices,
            renderer,
            logo,
            mailer,
            settings,
        }
    }

    pub async fn handle(&self, cmd: RunBillingCycleCommand) -> Result<BillingRunSummary, BillingError> {
        let today = cmd.now.date_naive();
        let due = self.subscriptions.list_due(today).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list due subscriptions");
            BillingError::from(e)
        })?;

        tracing::info!(count = due.len(), %today, "Starting billing run");

        let logo = match self.logo.fetch().await {
            Ok(logo) => Some(logo),
            Err(e) => {
                tracing::warn!(error = %e, "Invoice logo unavailable, using text header");
                None
            }
        };

        let mut summary = BillingRunSummary::default();
        for item in due {
            let subscription_id = item.subscription.id;
            match self.bill(item, cmd.now, logo.as_ref()).await {
                Ok(number) => {
                    summary.generated += 1;
                    tracing::info!(%subscription_id, invoice_number = %number, "Invoice generated");
                }
                Err(e @ BillingError::RelationMissing { .. }) => {
                    summary.errors += 1;
                    tracing::warn!(%subscription_id, error = %e, "Skipping subscription");
                }
                Err(e) => {
                    summary.errors += 1;
                    tracing::error!(%subscription_id, error = %e, "Failed to bill subscription");
                }
            }
        }

        tracing::info!(
            generated = summary.generated,
            errors = summary.errors,
            "Billing run finished"
        );
        Ok(summary)
    }

    async fn bill(
        &self,
        item: DueSubscription,
        now: DateTime<Utc>,
        logo: Option<&LogoImage>,
    ) -> Result<InvoiceNumber, BillingError> {
        let DueSubscription {
            subscription,
            plan,
            account,
        } = item;
        let plan = plan.ok_or_else(|| BillingError::relation_missing("subscription", "plan"))?;
        let account =
            account.ok_or_else(|| BillingError::relation_missing("subscription", "profile"))?;
        let email = account
            .contact_email()
            .ok_or_else(|| BillingError::relation_missing("subscription", "profile email"))?
            .to_string();

        let amount = subscription.final_price(&plan);
        let currency = plan.currency_or_default();
        let number = self.allocate_number(now.year()).await?;

        let invoice = Invoice::new(
            Some(subscription.id),
            account.id,
            number.clone(),
            amount,
            currency.clone(),
            now.date_naive(),
            now,
        )?;

        let document = InvoiceDocument {
            invoice_number: number.clone(),
            date: now.date_naive(),
            status: InvoiceStatus::Pending.as_str().to_string(),
            recipient_name: account.display_name().to_string(),
            recipient_email: email.clone(),
            plan_name: plan.name.clone(),
            amount,
            currency,
            billing_cycle: plan.billing_cycle.clone(),
        };
        let pdf = self.renderer.render(&document, logo);

        self.mailer
            .send(invoice_email(
                &email,
                account.display_name(),
                &self.settings.company_name,
                &invoice,
                pdf,
            ))
            .await?;

        self.invoices.create(&invoice).await?;

        let next = plan.billing_cycle.advance(subscription.next_billing_date)?;
        self.subscriptions
            .advance_next_billing_date(&subscription.id, next)
            .await?;

        Ok(number)
    }

    async fn allocate_number(&self, year: i32) -> Result<InvoiceNumber, BillingError> {
        for _ in 0..self.settings.invoice_number_attempts.max(1) {
            let candidate = InvoiceNumber::generate(year);
            if !self.invoices.number_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(invoice_number = %candidate, "Invoice number taken, regenerating");
        }
        Err(BillingError::infrastructure(format!(
            "No free invoice number after {} attempts",
            self.settings.invoice_number_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::pdf::StaticLogoSource;
    use crate::application::handlers::test_support::{date, plan, profile, subscription, Harness};
    use crate::domain::billing::BillingCycle;
    use crate::domain::foundation::{PlanId, Role, UserId};
    use crate::ports::{LogoImage, MailStream};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap()
    }

    fn handler(h: &Harness) -> RunBillingCycleHandler {
        handler_with_logo(h, StaticLogoSource::none())
    }

    fn handler_with_logo(h: &Harness, logo: StaticLogoSource) -> RunBillingCycleHandler {
        RunBillingCycleHandler::new(
            h.store.clone(),
            h.store.clone(),
            h.renderer.clone(),
            Arc::new(logo),
            h.mailer.clone(),
            BillingRunSettings::default(),
        )
    }

    async fn run(h: &Harness) -> BillingRunSummary {
        handler(h)
            .handle(RunBillingCycleCommand { now: now() })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn monthly_subscription_is_invoiced_and_rolled_forward() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let account = profile(Role::Client);
        let s1 = subscription(&account.id, &p.id, date(2024, 1, 1));
        h.store.insert_plan(p.clone());
        h.store.insert_profile(account.clone());
        h.store.insert_subscription(s1.clone());

        let summary = run(&h).await;

        assert_eq!(summary, BillingRunSummary { generated: 1, errors: 0 });
        let invoices = h.store.invoices();
        assert_eq!(invoices.len(), 1);
        let invoice = &invoices[0];
        assert_eq!(invoice.amount(), Decimal::from(5000));
        assert_eq!(invoice.currency, "KES");
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.due_date, date(2024, 1, 2));
        assert_eq!(invoice.subscription_id, Some(s1.id));
        assert_eq!(invoice.invoice_number.year(), 2024);
        assert_eq!(
            h.store.subscription(&s1.id).unwrap().next_billing_date,
            date(2024, 2, 1)
        );
    }

    #[tokio::test]
    async fn yearly_subscription_advances_one_year() {
        let h = Harness::new();
        let p = plan(60000, BillingCycle::Yearly, Some("KES"));
        let account = profile(Role::Client);
        let s = subscription(&account.id, &p.id, date(2023, 2, 28));
        h.store.insert_plan(p);
        h.store.insert_profile(account);
        h.store.insert_subscription(s.clone());

        run(&h).await;

        assert_eq!(
            h.store.subscription(&s.id).unwrap().next_billing_date,
            date(2024, 2, 28)
        );
    }

    #[tokio::test]
    async fn custom_price_overrides_plan_and_currency_defaults() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, None);
        let account = profile(Role::Client);
        let mut s = subscription(&account.id, &p.id, date(2024, 1, 1));
        s.custom_price = Some(Decimal::new(425050, 2));
        h.store.insert_plan(p);
        h.store.insert_profile(account);
        h.store.insert_subscription(s);

        run(&h).await;

        let invoice = &h.store.invoices()[0];
        assert_eq!(invoice.amount(), Decimal::new(425050, 2));
        assert_eq!(invoice.currency, "KES");
    }

    #[tokio::test]
    async fn missing_relations_are_skipped_and_counted() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let account = profile(Role::Client);
        h.store.insert_plan(p.clone());
        h.store.insert_profile(account.clone());

        let good = subscription(&account.id, &p.id, date(2024, 1, 1));
        let no_plan = subscription(&account.id, &PlanId::new(), date(2024, 1, 1));
        let no_profile = subscription(&UserId::new(), &p.id, date(2024, 1, 1));
        h.store.insert_subscription(no_plan.clone());
        h.store.insert_subscription(good.clone());
        h.store.insert_subscription(no_profile.clone());

        let summary = run(&h).await;

        assert_eq!(summary, BillingRunSummary { generated: 1, errors: 2 });
        assert_eq!(h.store.invoices().len(), 1);
        assert_eq!(
            h.store.subscription(&no_plan.id).unwrap().next_billing_date,
            date(2024, 1, 1)
        );
        assert_eq!(
            h.store.subscription(&no_profile.id).unwrap().next_billing_date,
            date(2024, 1, 1)
        );
    }

    #[tokio::test]
    async fn subscriptions_not_yet_due_or_inactive_are_ignored() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let account = profile(Role::Client);
        let future = subscription(&account.id, &p.id, date(2024, 1, 3));
        let mut inactive = subscription(&account.id, &p.id, date(2023, 12, 1));
        inactive.status = crate::domain::billing::SubscriptionStatus::parse("cancelled");
        h.store.insert_plan(p);
        h.store.insert_profile(account);
        h.store.insert_subscription(future);
        h.store.insert_subscription(inactive);

        let summary = run(&h).await;

        assert_eq!(summary, BillingRunSummary::default());
        assert!(h.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn email_failure_counts_error_and_keeps_billing_date() {
        let h = Harness::new();
        h.mailer.set_failing(true);
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let account = profile(Role::Client);
        let s = subscription(&account.id, &p.id, date(2024, 1, 1));
        h.store.insert_plan(p);
        h.store.insert_profile(account);
        h.store.insert_subscription(s.clone());

        let summary = run(&h).await;

        assert_eq!(summary, BillingRunSummary { generated: 0, errors: 1 });
        assert!(h.store.invoices().is_empty());
        assert_eq!(
            h.store.subscription(&s.id).unwrap().next_billing_date,
            date(2024, 1, 1)
        );
    }

    #[tokio::test]
    async fn persistence_failure_does_not_stop_later_subscriptions() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let failing = profile(Role::Client);
        let healthy = profile(Role::Client);
        h.store.insert_plan(p.clone());
        h.store.insert_profile(failing.clone());
        h.store.insert_profile(healthy.clone());
        h.store.fail_invoice_create_for(failing.id);
        let s_fail = subscription(&failing.id, &p.id, date(2024, 1, 1));
        let s_ok = subscription(&healthy.id, &p.id, date(2024, 1, 1));
        h.store.insert_subscription(s_fail.clone());
        h.store.insert_subscription(s_ok.clone());

        let summary = run(&h).await;

        assert_eq!(summary, BillingRunSummary { generated: 1, errors: 1 });
        assert_eq!(
            h.store.subscription(&s_fail.id).unwrap().next_billing_date,
            date(2024, 1, 1)
        );
        assert_eq!(
            h.store.subscription(&s_ok.id).unwrap().next_billing_date,
            date(2024, 2, 1)
        );
    }

    #[tokio::test]
    async fn listing_failure_fails_the_run() {
        let h = Harness::new();
        h.store.fail_listing();

        let result = handler(&h)
            .handle(RunBillingCycleCommand { now: now() })
            .await;

        assert!(matches!(result, Err(BillingError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn invoice_email_goes_to_account_holder_with_pdf() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        let account = profile(Role::Client);
        h.store.insert_plan(p.clone());
        h.store.insert_profile(account.clone());
        h.store
            .insert_subscription(subscription(&account.id, &p.id, date(2024, 1, 1)));

        run(&h).await;

        let sent = h.mailer.sent_on(MailStream::Billing);
        assert_eq!(sent.len(), 1);
        let number = h.store.invoices()[0].invoice_number.to_string();
        assert_eq!(sent[0].to, "jane@client.test");
        assert_eq!(sent[0].subject, format!("Invoice {}", number));
        assert_eq!(sent[0].attachments[0].filename, format!("Invoice-{}.pdf", number));

        let docs = h.renderer.documents();
        assert_eq!(docs[0].status, "pending");
        assert_eq!(docs[0].recipient_name, "Jane Client");
        assert_eq!(docs[0].plan_name, "Growth Retainer");
    }

    #[tokio::test]
    async fn logo_is_fetched_once_and_passed_to_every_render() {
        let h = Harness::new();
        let p = plan(5000, BillingCycle::Monthly, Some("KES"));
        h.store.insert_plan(p.clone());
        for _ in 0..2 {
            let account = profile(Role::Client);
            h.store.insert_profile(account.clone());
            h.store
                .insert_subscription(subscription(&account.id, &p.id, date(2024, 1, 1)));
        }
        let logo = StaticLogoSource::with(LogoImage {
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8],
        });

        handler_with_logo(&h, logo)
            .handle(RunBillingCycleCommand { now: now() })
            .await
            .unwrap();

        assert_eq!(h.renderer.logo_flags(), vec![true, true]);
    }
}
