//! Billing domain: plans, subscriptions, invoices and money.

mod billing_cycle;
mod errors;
mod invoice;
mod invoice_number;
mod money;
mod plan;
mod subscription;

pub use billing_cycle::BillingCycle;
pub use errors::BillingError;
pub use invoice::{Invoice, InvoiceStatus, PaymentCorrelation, PaymentReceipt};
pub use invoice_number::InvoiceNumber;
pub use money::{format_money, to_gateway_amount};
pub use plan::{AccountHolder, Plan, DEFAULT_CURRENCY};
pub use subscription::{DueSubscription, Subscription, SubscriptionStatus};
