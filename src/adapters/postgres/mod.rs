//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresSubscriptionRepository` - Due subscriptions with plan and profile joined
//! - `PostgresInvoiceRepository` - Invoices with conditional settlement
//! - `PostgresDonationRepository` - Donations with conditional settlement
//! - `PostgresProfileReader` - Account holder lookup

mod donation_repository;
mod invoice_repository;
mod profile_reader;
mod rows;
mod subscription_repository;

pub use donation_repository::PostgresDonationRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use profile_reader::PostgresProfileReader;
pub use subscription_repository::PostgresSubscriptionRepository;
