//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `SubscriptionRepository` - Due subscriptions and billing date roll-forward
//! - `InvoiceRepository` - Invoice persistence and conditional settlement
//! - `DonationRepository` - Donation persistence and conditional settlement
//! - `ProfileReader` - Account holder lookup (name, email, role)
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Mobile-money push payments
//! - `Mailer` - Transactional email
//! - `LogoSource` - Issuer logo for invoice headers
//! - `SessionValidator` - Access token validation
//!
//! ## Pure Ports
//!
//! - `InvoiceRenderer` - Invoice data to document bytes

mod donation_repository;
mod invoice_renderer;
mod invoice_repository;
mod logo_source;
mod mailer;
mod payment_gateway;
mod profile_reader;
mod session_validator;
mod subscription_repository;

pub use donation_repository::DonationRepository;
pub use invoice_renderer::{InvoiceDocument, InvoiceRenderer, LogoImage};
pub use invoice_repository::{InvoiceDetail, InvoiceRepository};
pub use logo_source::LogoSource;
pub use mailer::{Attachment, MailStream, Mailer, OutgoingEmail};
pub use payment_gateway::{
    GatewayError, PaymentGateway, StkPushRequest, StkPushResponse, RESPONSE_CODE_ACCEPTED,
};
pub use profile_reader::ProfileReader;
pub use session_validator::SessionValidator;
pub use subscription_repository::SubscriptionRepository;
