//! LLM provider implementations

pub mod openai;
pub mod traits;

pub use openai::OpenAIClient;
pub use traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
    ResponseFormat,
};

use crate::config::ProviderConfig;
use std::sync::Arc;

/// Build the configured provider.
///
/// A key is required for the hosted API; custom and local endpoints may run
/// without one.
pub fn create_provider(config: &ProviderConfig) -> ProviderResult<Arc<dyn LLMProvider>> {
    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var(&config.api_key_env).ok())
        .filter(|key| !key.trim().is_empty());

    if api_key.is_none() && config.base_url.is_none() {
        return Err(ProviderError::Config(format!(
            "{} not set",
            config.api_key_env
        )));
    }

    let mut client = OpenAIClient::new(api_key)
        .with_name(&config.name)
        .with_rate_limits(config.rpm, config.tpm)
        .with_model(&config.model);
    if let Some(url) = &config.base_url {
        client = client.with_base_url(url);
    }

    tracing::debug!(
        "Created provider {} at {} (model {})",
        config.name,
        client.base_url(),
        config.model
    );
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosted_api_requires_key() {
        let config = ProviderConfig {
            api_key_env: "EXTRACT_BENCH_TEST_UNSET_KEY".to_string(),
            ..ProviderConfig::default()
        };
        assert!(matches!(create_provider(&config), Err(ProviderError::Config(_))));
    }

    #[test]
    fn test_local_endpoint_without_key() {
        let config = ProviderConfig {
            name: "local".to_string(),
            base_url: Some("http://localhost:8000/v1/".to_string()),
            api_key_env: "EXTRACT_BENCH_TEST_UNSET_KEY".to_string(),
            model: "llama".to_string(),
            ..ProviderConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.default_model(), "llama");
        assert_eq!(provider.rate_limiter().requests_per_minute(), 500);
    }
}
