//! Mailer that records messages instead of sending them.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{MailStream, Mailer, OutgoingEmail};

/// Captures sent mail for assertions; can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: Mutex<bool>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_on(&self, stream: MailStream) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|email| email.stream == stream)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DomainError> {
        if *self.fail.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(DomainError::new(ErrorCode::EmailError, "Simulated email failure"));
        }
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            stream: MailStream::Accounts,
            to: "a@b.co".to_string(),
            subject: "Receipt".to_string(),
            html: String::new(),
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn records_and_filters_by_stream() {
        let mailer = RecordingMailer::new();
        mailer.send(email()).await.unwrap();
        assert_eq!(mailer.sent_on(MailStream::Accounts).len(), 1);
        assert!(mailer.sent_on(MailStream::Billing).is_empty());
    }

    #[tokio::test]
    async fn failing_mailer_records_nothing() {
        let mailer = RecordingMailer::failing();
        assert!(mailer.send(email()).await.is_err());
        assert!(mailer.sent().is_empty());
    }
}
