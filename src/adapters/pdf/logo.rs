//! Logo asset sources.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{LogoImage, LogoSource};

/// Downloads the logo from a public URL on every fetch.
pub struct HttpLogoSource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpLogoSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::ConfigurationError, format!("HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl LogoSource for HttpLogoSource {
    async fn fetch(&self) -> Result<LogoImage, DomainError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::AssetError, format!("Logo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::new(
                ErrorCode::AssetError,
                format!("Logo fetch returned {}", status),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::new(ErrorCode::AssetError, format!("Logo body: {}", e)))?;

        tracing::debug!(url = %self.url, bytes = bytes.len(), "Fetched invoice logo");
        Ok(LogoImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// Source used when no logo is configured, or in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticLogoSource {
    logo: Option<LogoImage>,
}

impl StaticLogoSource {
    pub fn none() -> Self {
        Self { logo: None }
    }

    pub fn with(logo: LogoImage) -> Self {
        Self { logo: Some(logo) }
    }
}

#[async_trait]
impl LogoSource for StaticLogoSource {
    async fn fetch(&self) -> Result<LogoImage, DomainError> {
        self.logo
            .clone()
            .ok_or_else(|| DomainError::new(ErrorCode::AssetError, "No logo configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_without_logo_errors() {
        let err = StaticLogoSource::none().fetch().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AssetError);
    }

    #[tokio::test]
    async fn static_source_returns_configured_logo() {
        let logo = LogoImage {
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8],
        };
        let fetched = StaticLogoSource::with(logo.clone()).fetch().await.unwrap();
        assert_eq!(fetched, logo);
    }

    #[tokio::test]
    async fn unreachable_url_is_an_asset_error() {
        let source = HttpLogoSource::new("http://127.0.0.1:9/logo.jpg", Duration::from_millis(500)).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AssetError);
    }
}
