//! Resend HTTP API mailer.
//!
//! Sends `OutgoingEmail`s through `POST {base}/emails`. Attachments are
//! base64-encoded inline. The sender address is chosen by mail stream.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{MailStream, Mailer, OutgoingEmail};

/// Resend adapter configuration.
#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: SecretString,
    pub api_base_url: String,
    /// Full "Name <address>" header for the billing stream.
    pub billing_from: String,
    /// Full "Name <address>" header for the accounts stream.
    pub accounts_from: String,
    pub timeout: Duration,
}

impl ResendConfig {
    fn from_header(&self, stream: MailStream) -> &str {
        match stream {
            MailStream::Billing => &self.billing_from,
            MailStream::Accounts => &self.accounts_from,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentBody<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    config: ResendConfig,
    http_client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::ConfigurationError, format!("HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn body<'a>(&'a self, email: &'a OutgoingEmail) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: self.config.from_header(email.stream),
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                    content_type: &a.content_type,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), DomainError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ConfigurationError,
                "Email API key is not configured",
            ));
        }

        let url = format!("{}/emails", self.config.api_base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.body(&email))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, subject = %email.subject, "Email request failed");
                DomainError::new(ErrorCode::EmailError, format!("Email request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Email API rejected message");
            return Err(DomainError::new(
                ErrorCode::EmailError,
                format!("Email API returned {}", status),
            ));
        }

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

    fn mailer(api_key: &str) -> ResendMailer {
        ResendMailer::new(ResendConfig {
            api_key: SecretString::new(api_key.to_string()),
            api_base_url: "https://api.resend.com".to_string(),
            billing_from: "Acme Billing <billing@acme.test>".to_string(),
            accounts_from: "Acme Accounts <accounts@acme.test>".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
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

    #[test]
    fn body_picks_sender_by_stream_and_encodes_attachments() {
        let mailer = mailer("re_test");
        let billing = email(MailStream::Billing);
        let json = serde_json::to_value(mailer.body(&billing)).unwrap();
        assert_eq!(json["from"], "Acme Billing <billing@acme.test>");
        assert_eq!(json["to"][0], "client@example.com");
        assert_eq!(json["attachments"][0]["content"], STANDARD.encode(b"%PDF-1.4"));

        let accounts = OutgoingEmail {
            attachments: vec![],
            ..email(MailStream::Accounts)
        };
        let json = serde_json::to_value(mailer.body(&accounts)).unwrap();
        assert_eq!(json["from"], "Acme Accounts <accounts@acme.test>");
        assert!(json.get("attachments").is_none());
    }

    #[tokio::test]
    async fn missing_api_key_is_configuration_error() {
        let err = mailer("").send(email(MailStream::Billing)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }
}
