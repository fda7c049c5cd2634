//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidHost,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least 32 characters in production")]
    WeakJwtSecret,

    #[error("M-Pesa environment must be 'sandbox' or 'production'")]
    InvalidMpesaEnvironment,

    #[error("Invalid M-Pesa short code")]
    InvalidShortcode,

    #[error("Callback base URL must be an absolute http(s) URL")]
    InvalidCallbackUrl,

    #[error("Callback base URL must use HTTPS in production")]
    CallbackUrlMustBeHttps,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Invalid SMTP port")]
    InvalidSmtpPort,

    #[error("SMTP user and password must be set together")]
    IncompleteSmtpCredentials,

    #[error("Logo URL must be an absolute http(s) URL")]
    InvalidLogoUrl,

    #[error("Invoice number attempts must be between 1 and 20")]
    InvalidInvoiceNumberAttempts,
}
