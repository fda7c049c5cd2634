//! SMTP mailer.
//!
//! Builds a MIME message per `OutgoingEmail` (HTML body, attachments as
//! `multipart/mixed`) and hands it to a pooled async SMTP transport. The
//! sender address is chosen by mail stream, as with the Resend adapter.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{MailStream, Mailer, OutgoingEmail};

/// SMTP adapter configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Username and password; `None` for an unauthenticated relay.
    pub credentials: Option<(String, SecretString)>,
    /// TLS from connect instead of STARTTLS.
    pub implicit_tls: bool,
    /// Full "Name <address>" header for the billing stream.
    pub billing_from: String,
    /// Full "Name <address>" header for the accounts stream.
    pub accounts_from: String,
    pub timeout: Duration,
}

/// Mailer backed by an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    billing_from: Mailbox,
    accounts_from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport. No connection is opened until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, DomainError> {
        let builder = if config.implicit_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| configuration(format!("SMTP relay {}: {}", config.host, e)))?;

        let mut builder = builder.port(config.port).timeout(Some(config.timeout));
        if let Some((user, password)) = &config.credentials {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            billing_from: parse_sender(&config.billing_from)?,
            accounts_from: parse_sender(&config.accounts_from)?,
        })
    }

    fn sender(&self, stream: MailStream) -> &Mailbox {
        match stream {
            MailStream::Billing => &self.billing_from,
            MailStream::Accounts => &self.accounts_from,
        }
    }

    fn message(&self, email: &OutgoingEmail) -> Result<Message, DomainError> {
        let to: Mailbox = email.to.parse().map_err(|e| {
            DomainError::new(
                ErrorCode::EmailError,
                format!("Invalid recipient {}: {}", email.to, e),
            )
        })?;

        let builder = Message::builder()
            .from(self.sender(email.stream).clone())
            .to(to)
            .subject(email.subject.as_str());
        let html = SinglePart::html(email.html.clone());

        let built = if email.attachments.is_empty() {
            builder.singlepart(html)
        } else {
            let mut parts = MultiPart::mixed().singlepart(html);
            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    DomainError::new(
                        ErrorCode::EmailError,
                        format!("Invalid attachment type {}: {}", attachment.content_type, e),
                    )
                })?;
                parts = parts.singlepart(
                    MimeAttachment::new(attachment.filename.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder.multipart(parts)
        };

        built.map_err(|e| DomainError::new(ErrorCode::EmailError, format!("Building message: {}", e)))
    }
}

fn parse_sender(header: &str) -> Result<Mailbox, DomainError> {
    header
        .parse()
        .map_err(|e| configuration(format!("Invalid sender {}: {}", header, e)))
}

fn configuration(message: String) -> DomainError {
    DomainError::new(ErrorCode::ConfigurationError, message)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DomainError> {
        let message = self.message(&email)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::error!(error = %e, subject = %email.subject, "SMTP send failed");
            DomainError::new(ErrorCode::EmailError, format!("SMTP send failed: {}", e))
        })?;

        tracing::info!(
            stream = ?email.stream,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Attachment;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.acme.test".to_string(),
            port: 587,
            credentials: Some(("mailer".to_string(), SecretString::new("hunter2".to_string()))),
            implicit_tls: false,
            billing_from: "Acme Billing <billing@acme.test>".to_string(),
            accounts_from: "Acme Accounts <accounts@acme.test>".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn email(stream: MailStream) -> OutgoingEmail {
        OutgoingEmail {
            stream,
            to: "client@example.com".to_string(),
            subject: "Invoice INV-2024-0001".to_string(),
            html: "<p>Hello</p>".to_string(),
            attachments: vec![Attachment::pdf("Invoice-INV-2024-0001.pdf", b"%PDF-1.4".to_vec())],
        }
    }

    fn formatted(message: Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[tokio::test]
    async fn message_carries_stream_sender_and_pdf_attachment() {
        let mailer = SmtpMailer::new(config()).unwrap();

        let raw = formatted(mailer.message(&email(MailStream::Billing)).unwrap());

        assert!(raw.contains("Acme Billing"));
        assert!(raw.contains("<billing@acme.test>"));
        assert!(raw.contains("client@example.com"));
        assert!(raw.contains("Subject: Invoice INV-2024-0001"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("Content-Type: application/pdf"));
        assert!(raw.contains("Invoice-INV-2024-0001.pdf"));
    }

    #[tokio::test]
    async fn receipt_without_attachments_is_single_part() {
        let mailer = SmtpMailer::new(config()).unwrap();
        let receipt = OutgoingEmail {
            attachments: vec![],
            ..email(MailStream::Accounts)
        };

        let raw = formatted(mailer.message(&receipt).unwrap());

        assert!(raw.contains("<accounts@acme.test>"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(!raw.contains("multipart/mixed"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_email_error() {
        let mailer = SmtpMailer::new(config()).unwrap();
        let bad = OutgoingEmail {
            to: "not an address".to_string(),
            ..email(MailStream::Billing)
        };

        let err = mailer.message(&bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailError);
    }

    #[tokio::test]
    async fn invalid_sender_is_configuration_error() {
        let err = SmtpMailer::new(SmtpConfig {
            billing_from: "Acme Billing".to_string(),
            ..config()
        })
        .err()
        .unwrap();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn unreachable_relay_is_email_error() {
        let mailer = SmtpMailer::new(SmtpConfig {
            host: "localhost".to_string(),
            port: 1,
            credentials: None,
            timeout: Duration::from_secs(2),
            ..config()
        })
        .unwrap();

        let err = mailer.send(email(MailStream::Billing)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailError);
    }
}
