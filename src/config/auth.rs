//! Authentication configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (hosted auth backend, HS256 access tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the auth backend signs access tokens with
    #[serde(default)]
    pub jwt_secret: String,

    /// Expected audience claim
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Expected issuer claim; unchecked when absent
    pub jwt_issuer: Option<String>,
}

impl AuthConfig {
    pub fn secret(&self) -> SecretString {
        SecretString::new(self.jwt_secret.clone())
    }

    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 characters.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PORTAL__AUTH__JWT_SECRET"));
        }
        if self.jwt_audience.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PORTAL__AUTH__JWT_AUDIENCE"));
        }
        if *environment == Environment::Production && self.jwt_secret.len() < 32 {
            return Err(ValidationError::WeakJwtSecret);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_audience: default_audience(),
            jwt_issuer: None,
        }
    }
}

fn default_audience() -> String {
    "authenticated".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_config_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.jwt_audience, "authenticated");
        assert!(config.jwt_issuer.is_none());
    }

    #[test]
    fn test_validation_missing_secret() {
        assert!(AuthConfig::default().validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_validation_production_requires_long_secret() {
        let config = AuthConfig {
            jwt_secret: "short".to_string(),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::WeakJwtSecret)
        );
    }

    #[test]
    fn test_validation_valid_config() {
        let config = AuthConfig {
            jwt_secret: "x".repeat(40),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }
}
