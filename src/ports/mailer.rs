//! Outbound email port.
//!
//! Billing mail (invoices) and account mail (receipts) go out from
//! different sender addresses; adapters pick the sender from the stream.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Sender stream of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailStream {
    Billing,
    Accounts,
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            content,
        }
    }
}

/// A message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub stream: MailStream,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Port for the email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message. No retries.
    ///
    /// # Errors
    ///
    /// - `EmailError` if the transport rejects or cannot be reached
    async fn send(&self, email: OutgoingEmail) -> Result<(), DomainError>;
}
