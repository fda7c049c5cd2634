//! M-Pesa (Daraja) gateway configuration
//!
//! Credentials may be left unset at startup; the gateway then fails each
//! push with a configuration error instead of refusing to boot.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MpesaConfig {
    /// `sandbox` or `production`
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Overrides the base URL derived from `environment`
    pub base_url: Option<String>,

    #[serde(default)]
    pub consumer_key: String,

    #[serde(default)]
    pub consumer_secret: String,

    /// Pay bill short code (also the password's business code)
    #[serde(default)]
    pub shortcode: String,

    #[serde(default)]
    pub passkey: String,

    /// Till number credited by buy-goods pushes
    pub till_number: Option<String>,

    /// Public base URL the gateway posts callbacks to
    #[serde(default)]
    pub callback_base_url: String,

    /// HTTP timeout for gateway calls in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Seconds before token expiry at which a cached token is refreshed
    #[serde(default = "default_token_margin")]
    pub token_refresh_margin_secs: u64,
}

impl MpesaConfig {
    /// Gateway base URL without trailing slash.
    pub fn base_url(&self) -> String {
        let url = match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim(),
            _ if self.environment == "production" => PRODUCTION_BASE_URL,
            _ => SANDBOX_BASE_URL,
        };
        url.trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token_refresh_margin(&self) -> Duration {
        Duration::from_secs(self.token_refresh_margin_secs)
    }

    /// True when every value a push needs is present.
    pub fn is_configured(&self) -> bool {
        !self.consumer_key.is_empty()
            && !self.consumer_secret.is_empty()
            && !self.shortcode.is_empty()
            && !self.passkey.is_empty()
            && !self.callback_base_url.is_empty()
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.environment != "sandbox" && self.environment != "production" {
            return Err(ValidationError::InvalidMpesaEnvironment);
        }
        if !self.shortcode.is_empty() && !self.shortcode.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidShortcode);
        }
        if let Some(till) = &self.till_number {
            if !till.is_empty() && !till.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValidationError::InvalidShortcode);
            }
        }
        if !self.callback_base_url.is_empty() {
            let url = &self.callback_base_url;
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidCallbackUrl);
            }
            if *environment == Environment::Production && !url.starts_with("https://") {
                return Err(ValidationError::CallbackUrlMustBeHttps);
            }
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for MpesaConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            base_url: None,
            consumer_key: String::new(),
            consumer_secret: String::new(),
            shortcode: String::new(),
            passkey: String::new(),
            till_number: None,
            callback_base_url: String::new(),
            request_timeout_secs: default_timeout(),
            token_refresh_margin_secs: default_token_margin(),
        }
    }
}

fn default_environment() -> String {
    "sandbox".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_token_margin() -> u64 {
    60
}
