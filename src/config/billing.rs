//! Billing configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Billing scheduler and invoice issuer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Shared secret the scheduler trigger must present
    #[serde(default)]
    pub cron_secret: String,

    /// Issuer name printed on invoices
    #[serde(default = "default_company_name")]
    pub company_name: String,

    /// Issuer contact email printed on invoices
    #[serde(default = "default_company_email")]
    pub company_email: String,

    /// Issuer postal address (one line)
    #[serde(default)]
    pub company_address: String,

    /// Logo printed in the invoice header (JPEG)
    pub logo_url: Option<String>,

    /// Timeout for the logo fetch in seconds
    #[serde(default = "default_logo_timeout")]
    pub logo_timeout_secs: u64,

    /// How many invoice numbers to try before giving up on a subscription
    #[serde(default = "default_number_attempts")]
    pub invoice_number_attempts: u32,
}

impl BillingConfig {
    pub fn cron_secret(&self) -> SecretString {
        SecretString::new(self.cron_secret.clone())
    }

    pub fn logo_timeout(&self) -> Duration {
        Duration::from_secs(self.logo_timeout_secs)
    }

    /// Validate billing configuration
    ///
    /// The cron secret may be empty outside production, in which case the
    /// trigger rejects every request.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && self.cron_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PORTAL__BILLING__CRON_SECRET"));
        }
        if !self.company_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if let Some(url) = &self.logo_url {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidLogoUrl);
            }
        }
        if self.invoice_number_attempts == 0 || self.invoice_number_attempts > 20 {
            return Err(ValidationError::InvalidInvoiceNumberAttempts);
        }
        if self.logo_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cron_secret: String::new(),
            company_name: default_company_name(),
            company_email: default_company_email(),
            company_address: String::new(),
            logo_url: None,
            logo_timeout_secs: default_logo_timeout(),
            invoice_number_attempts: default_number_attempts(),
        }
    }
}

fn default_company_name() -> String {
    "Consultancy Portal".to_string()
}

fn default_company_email() -> String {
    "billing@example.com".to_string()
}

fn default_logo_timeout() -> u64 {
    5
}

fn default_number_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_config_defaults() {
        let config = BillingConfig::default();
        assert_eq!(config.invoice_number_attempts, 5);
        assert_eq!(config.logo_timeout(), Duration::from_secs(5));
        assert!(config.logo_url.is_none());
    }

    #[test]
    fn test_production_requires_cron_secret() {
        let config = BillingConfig::default();
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::MissingRequired("PORTAL__BILLING__CRON_SECRET"))
        );
    }

    #[test]
    fn test_logo_url_must_be_absolute() {
        let config = BillingConfig {
            logo_url: Some("/logo.jpg".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidLogoUrl)
        );
    }

    #[test]
    fn test_attempts_bounds() {
        let config = BillingConfig {
            invoice_number_attempts: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidInvoiceNumberAttempts)
        );
    }
}
