//! API client factory.
//!
//! Builds the `TemplateApi` implementation from application configuration:
//! validates the settings, resolves the token and applies the timeout.

use crate::client::TemplateApi;
use crate::http::HttpTemplateApi;
use promptify_core::{AppConfig, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create the API client described by `config`.
///
/// # Errors
/// Returns error if:
/// - The API URL is not an http(s) URL
/// - No token is configured
/// - The HTTP client cannot be initialized
pub fn create_client(config: &AppConfig) -> AppResult<Arc<dyn TemplateApi>> {
    config.validate()?;
    let token = config.require_token()?;

    let mut client = HttpTemplateApi::new(&config.api_url, token)?;
    if let Some(secs) = config.timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }

    tracing::debug!("Using Promptify API at {}", client.base_url());
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptify_core::AppError;

    #[test]
    fn test_create_client_with_token() {
        let mut config = AppConfig::default();
        config.api_token = Some("token".to_string());
        config.timeout_secs = Some(10);
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_create_client_requires_token() {
        match create_client(&AppConfig::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("API token not configured")),
            Err(other) => panic!("Expected Config error, got {:?}", other),
            Ok(_) => panic!("Expected error without token"),
        }
    }

    #[test]
    fn test_create_client_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.api_token = Some("token".to_string());
        config.api_url = "localhost:8000".to_string();
        assert!(create_client(&config).is_err());
    }
}
