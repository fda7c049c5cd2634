//! Email configuration

use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// How outgoing mail leaves the service
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    /// Resend HTTP API
    #[default]
    Resend,
    /// Plain SMTP relay (STARTTLS or implicit TLS)
    Smtp,
}

/// Email configuration (Resend HTTP API or SMTP relay)
///
/// Invoices go out from the billing stream, payment receipts from the
/// accounts stream.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Which transport sends mail
    #[serde(default)]
    pub transport: EmailTransport,

    /// Resend API key
    #[serde(default)]
    pub resend_api_key: String,

    /// API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Billing stream sender address
    #[serde(default = "default_billing_from")]
    pub billing_from_email: String,

    /// Accounts stream sender address
    #[serde(default = "default_accounts_from")]
    pub accounts_from_email: String,

    /// Display name on both streams
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// SMTP relay host
    #[serde(default)]
    pub smtp_host: String,

    /// SMTP port (587 for STARTTLS, 465 for implicit TLS)
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username; empty means an unauthenticated relay
    #[serde(default)]
    pub smtp_user: String,

    /// SMTP password
    #[serde(default)]
    pub smtp_pass: String,

    /// Connect with TLS from the first byte instead of STARTTLS
    #[serde(default)]
    pub smtp_implicit_tls: bool,

    /// Send timeout in seconds (HTTP request or SMTP session)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl EmailConfig {
    /// "From" header for the billing stream
    pub fn billing_from_header(&self) -> String {
        format!("{} Billing <{}>", self.from_name, self.billing_from_email)
    }

    /// "From" header for the accounts stream
    pub fn accounts_from_header(&self) -> String {
        format!("{} Accounts <{}>", self.from_name, self.accounts_from_email)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// SMTP login, if one is configured
    pub fn smtp_credentials(&self) -> Option<(&str, &str)> {
        Some((self.smtp_user.as_str(), self.smtp_pass.as_str())).filter(|(user, _)| !user.is_empty())
    }

    /// Validate email configuration for the selected transport
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.transport {
            EmailTransport::Resend => {
                if self.resend_api_key.is_empty() {
                    return Err(ValidationError::MissingRequired("PORTAL__EMAIL__RESEND_API_KEY"));
                }
                if !self.resend_api_key.starts_with("re_") {
                    return Err(ValidationError::InvalidResendKey);
                }
            }
            EmailTransport::Smtp => {
                if self.smtp_host.is_empty() {
                    return Err(ValidationError::MissingRequired("PORTAL__EMAIL__SMTP_HOST"));
                }
                if self.smtp_port == 0 {
                    return Err(ValidationError::InvalidSmtpPort);
                }
                if self.smtp_user.is_empty() != self.smtp_pass.is_empty() {
                    return Err(ValidationError::IncompleteSmtpCredentials);
                }
            }
        }
        if !self.billing_from_email.contains('@') || !self.accounts_from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransport::default(),
            resend_api_key: String::new(),
            api_base_url: default_api_base_url(),
            billing_from_email: default_billing_from(),
            accounts_from_email: default_accounts_from(),
            from_name: default_from_name(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            smtp_implicit_tls: false,
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_billing_from() -> String {
    "billing@example.com".to_string()
}

fn default_accounts_from() -> String {
    "accounts@example.com".to_string()
}

fn default_from_name() -> String {
    "Consultancy Portal".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_timeout() -> u64 {
    20
}
