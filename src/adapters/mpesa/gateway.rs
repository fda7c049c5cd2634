//! Daraja STK push adapter.
//!
//! Implements the `PaymentGateway` port against the Safaricom Daraja API:
//!
//! 1. Fetch an OAuth token with HTTP Basic credentials (cached until shortly
//!    before it expires)
//! 2. Derive the request password from short code, pass key and timestamp
//! 3. POST the push request with the flow's transaction type and callback
//!
//! # Configuration
//!
//! ```ignore
//! let gateway = MpesaGateway::new(MpesaGatewayConfig { .. })?;
//! let response = gateway.initiate_push(request).await?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use crate::domain::payment::{format_gateway_timestamp, PaymentFlow};
use crate::ports::{GatewayError, PaymentGateway, StkPushRequest, StkPushResponse};

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// Gateway adapter configuration.
#[derive(Clone)]
pub struct MpesaGatewayConfig {
    /// API base URL without trailing slash.
    pub base_url: String,
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub shortcode: String,
    pub passkey: SecretString,
    /// Receiving till for buy-goods pushes.
    pub till_number: Option<String>,
    /// Public base URL callbacks are posted to.
    pub callback_base_url: String,
    pub timeout: Duration,
    /// Cached tokens are refreshed this long before they expire.
    pub token_refresh_margin: Duration,
}

impl MpesaGatewayConfig {
    /// Name of the first required value that is not set.
    fn missing(&self) -> Option<&'static str> {
        if self.consumer_key.expose_secret().is_empty() {
            Some("consumer_key")
        } else if self.consumer_secret.expose_secret().is_empty() {
            Some("consumer_secret")
        } else if self.shortcode.is_empty() {
            Some("shortcode")
        } else if self.passkey.expose_secret().is_empty() {
            Some("passkey")
        } else if self.callback_base_url.is_empty() {
            Some("callback_base_url")
        } else {
            None
        }
    }

    /// Receiving party for a flow: the till for buy-goods when one is set.
    pub fn party_b(&self, flow: PaymentFlow) -> &str {
        match (flow, self.till_number.as_deref()) {
            (PaymentFlow::Donation, Some(till)) if !till.is_empty() => till,
            _ => &self.shortcode,
        }
    }

    pub fn callback_url(&self, flow: PaymentFlow) -> String {
        format!(
            "{}{}",
            self.callback_base_url.trim_end_matches('/'),
            flow.callback_path()
        )
    }

    /// `base64(shortcode + passkey + timestamp)`.
    pub fn password(&self, timestamp: &str) -> String {
        STANDARD.encode(format!(
            "{}{}{}",
            self.shortcode,
            self.passkey.expose_secret(),
            timestamp
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(deserialize_with = "lenient_seconds")]
    expires_in: u64,
}

/// Push request body in the gateway's field naming.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PushBody<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: String,
    transaction_type: &'static str,
    amount: i64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    call_back_url: String,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

impl CachedToken {
    fn new(token: String, expires_in: Duration, margin: Duration) -> Self {
        Self {
            token: SecretString::new(token),
            refresh_at: Instant::now() + expires_in.saturating_sub(margin),
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Daraja push payment gateway.
pub struct MpesaGateway {
    config: MpesaGatewayConfig,
    http_client: reqwest::Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl MpesaGateway {
    pub fn new(config: MpesaGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    async fn fetch_token(&self) -> Result<CachedToken, GatewayError> {
        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);
        tracing::debug!(url = %url, "Requesting gateway access token");

        let response = self
            .http_client
            .get(&url)
            .basic_auth(
                self.config.consumer_key.expose_secret(),
                Some(self.config.consumer_secret.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gateway token request failed");
                GatewayError::Auth(format!("token request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Gateway token endpoint returned error");
            return Err(GatewayError::Auth(format!("token endpoint returned {}", status)));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse gateway token response");
            GatewayError::Auth(format!("invalid token response: {}", e))
        })?;

        Ok(CachedToken::new(
            token.access_token,
            Duration::from_secs(token.expires_in),
            self.config.token_refresh_margin,
        ))
    }

    /// Returns a cached token or fetches a new one.
    async fn access_token(&self) -> Result<SecretString, GatewayError> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh()) {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *self.token_cache.write().await = Some(fresh);
        Ok(token)
    }

    async fn push(
        &self,
        request: &StkPushRequest,
        now: DateTime<Utc>,
    ) -> Result<StkPushResponse, GatewayError> {
        match self.config.missing() {
            Some(name @ ("consumer_key" | "consumer_secret")) => {
                return Err(GatewayError::Auth(format!("{} is not set", name)));
            }
            Some(name) => {
                return Err(GatewayError::Configuration(format!("{} is not set", name)));
            }
            None => {}
        }

        let token = self.access_token().await?;
        let timestamp = format_gateway_timestamp(now);
        let phone = request.phone.as_str();
        let body = PushBody {
            business_short_code: &self.config.shortcode,
            password: self.config.password(&timestamp),
            timestamp,
            transaction_type: request.flow.transaction_type().as_str(),
            amount: request.amount,
            party_a: phone,
            party_b: self.config.party_b(request.flow),
            phone_number: phone,
            call_back_url: self.config.callback_url(request.flow),
            account_reference: &request.account_reference,
            transaction_desc: &request.description,
        };

        let url = format!("{}{}", self.config.base_url, PUSH_PATH);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gateway push request failed");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Gateway rejected push request");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<StkPushResponse>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse gateway push response");
            GatewayError::InvalidResponse(e.to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for MpesaGateway {
    async fn initiate_push(&self, request: StkPushRequest) -> Result<StkPushResponse, GatewayError> {
        tracing::info!(
            flow = %request.flow,
            account_reference = %request.account_reference,
            amount = request.amount,
            "Initiating STK push"
        );

        let response = self.push(&request, Utc::now()).await?;

        tracing::info!(
            flow = %request.flow,
            merchant_request_id = %response.merchant_request_id,
            checkout_request_id = %response.checkout_request_id,
            response_code = %response.response_code,
            "STK push answered"
        );
        Ok(response)
    }
}

impl std::fmt::Debug for MpesaGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpesaGateway")
            .field("base_url", &self.config.base_url)
            .field("shortcode", &self.config.shortcode)
            .finish_non_exhaustive()
    }
}

/// Daraja sends `expires_in` as a string; accept numbers too.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("expires_in is not a positive integer")),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom("expires_in is not a positive integer")),
        _ => Err(serde::de::Error::custom("expires_in must be a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MpesaGatewayConfig {
        MpesaGatewayConfig {
            base_url: "https://sandbox.safaricom.co.ke".to_string(),
            consumer_key: SecretString::new("key".to_string()),
            consumer_secret: SecretString::new("secret".to_string()),
            shortcode: "174379".to_string(),
            passkey: SecretString::new("passkey".to_string()),
            till_number: Some("5551234".to_string()),
            callback_base_url: "https://portal.example.com/".to_string(),
            timeout: Duration::from_secs(5),
            token_refresh_margin: Duration::from_secs(60),
        }
    }

    #[test]
    fn password_is_base64_of_shortcode_passkey_timestamp() {
        let password = config().password("20240101120000");
        let decoded = STANDARD.decode(password).unwrap();
        assert_eq!(decoded, b"174379passkey20240101120000");
    }

    #[test]
    fn party_b_uses_till_only_for_donations() {
        let cfg = config();
        assert_eq!(cfg.party_b(PaymentFlow::Donation), "5551234");
        assert_eq!(cfg.party_b(PaymentFlow::Invoice), "174379");

        let no_till = MpesaGatewayConfig {
            till_number: None,
            ..config()
        };
        assert_eq!(no_till.party_b(PaymentFlow::Donation), "174379");
    }

    #[test]
    fn callback_url_joins_without_double_slash() {
        assert_eq!(
            config().callback_url(PaymentFlow::Invoice),
            "https://portal.example.com/api/webhooks/mpesa/invoices"
        );
    }

    #[test]
    fn missing_reports_first_unset_value() {
        let cfg = MpesaGatewayConfig {
            passkey: SecretString::new(String::new()),
            ..config()
        };
        assert_eq!(cfg.missing(), Some("passkey"));
        assert_eq!(config().missing(), None);
    }

    #[test]
    fn push_body_uses_gateway_field_names() {
        let body = PushBody {
            business_short_code: "174379",
            password: "pw".to_string(),
            timestamp: "20240101120000".to_string(),
            transaction_type: "CustomerPayBillOnline",
            amount: 5000,
            party_a: "254712345678",
            party_b: "174379",
            phone_number: "254712345678",
            call_back_url: "https://x/cb".to_string(),
            account_reference: "INV-2024-0001",
            transaction_desc: "Invoice",
        };
        let json = serde_json::to_value(&body).unwrap();
        for key in [
            "BusinessShortCode",
            "Password",
            "Timestamp",
            "TransactionType",
            "Amount",
            "PartyA",
            "PartyB",
            "PhoneNumber",
            "CallBackURL",
            "AccountReference",
            "TransactionDesc",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["Amount"], 5000);
    }

    #[test]
    fn token_response_accepts_string_expiry() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":"3599"}"#).unwrap();
        assert_eq!(token.expires_in, 3599);
    }

    #[test]
    fn cached_token_respects_margin() {
        let fresh = CachedToken::new("t".to_string(), Duration::from_secs(3600), Duration::from_secs(60));
        assert!(fresh.is_fresh());
        let stale = CachedToken::new("t".to_string(), Duration::from_secs(30), Duration::from_secs(60));
        assert!(!stale.is_fresh());
    }

    #[tokio::test]
    async fn unconfigured_gateway_fails_before_any_request() {
        let request = || StkPushRequest {
            phone: crate::domain::payment::PhoneNumber::parse("0712345678").unwrap(),
            amount: 10,
            account_reference: "INV-2024-0001".to_string(),
            description: "Invoice".to_string(),
            flow: PaymentFlow::Invoice,
        };

        let no_credentials = MpesaGateway::new(MpesaGatewayConfig {
            consumer_key: SecretString::new(String::new()),
            ..config()
        })
        .unwrap();
        assert!(matches!(
            no_credentials.initiate_push(request()).await,
            Err(GatewayError::Auth(_))
        ));

        let no_passkey = MpesaGateway::new(MpesaGatewayConfig {
            passkey: SecretString::new(String::new()),
            ..config()
        })
        .unwrap();
        assert!(matches!(
            no_passkey.initiate_push(request()).await,
            Err(GatewayError::Configuration(_))
        ));
    }
}
