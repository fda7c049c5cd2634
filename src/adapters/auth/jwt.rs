//! HS256 JWT adapter for the hosted auth backend.
//!
//! The auth backend signs access tokens with a shared secret. This adapter
//! implements the `SessionValidator` port by:
//!
//! 1. Verifying the HS256 signature with the configured secret
//! 2. Validating audience, expiry and (when configured) issuer
//! 3. Mapping `sub` and `email` to the domain `AuthenticatedUser`

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT validator.
#[derive(Clone)]
pub struct JwtValidatorConfig {
    pub secret: SecretString,
    /// Expected `aud` claim (the auth backend uses `authenticated`).
    pub audience: String,
    /// Expected `iss` claim; not checked when `None`.
    pub issuer: Option<String>,
}

/// JWT claims issued by the auth backend.
#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,

    #[serde(default)]
    aud: Audience,

    exp: i64,

    #[serde(default)]
    email: Option<String>,

    #[serde(default)]
    role: Option<String>,
}

/// Audience can be a single string or array of strings in JWTs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
enum Audience {
    #[default]
    None,
    Single(String),
    Multiple(Vec<String>),
}

/// Validates access tokens signed with the shared HS256 secret.
pub struct JwtSessionValidator {
    config: JwtValidatorConfig,
}

impl JwtSessionValidator {
    pub fn new(config: JwtValidatorConfig) -> Self {
        Self { config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let secret = self.config.secret.expose_secret();
        if secret.is_empty() {
            return Err(AuthError::ServiceUnavailable(
                "JWT secret is not configured".to_string(),
            ));
        }

        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = decode::<AccessTokenClaims>(token, &key, &self.validation()).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidAudience => {
                    tracing::warn!("Invalid audience in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let user_id: UserId = claims.sub.parse().map_err(|_| {
            tracing::warn!("Invalid user ID in token: {}", claims.sub);
            AuthError::InvalidToken
        })?;

        tracing::trace!(user_id = %user_id, token_role = ?claims.role, aud = ?claims.aud, "Token validated");

        Ok(AuthenticatedUser::new(user_id, claims.email))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("audience", &self.config.audience)
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}
