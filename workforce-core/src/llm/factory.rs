//! Factory for creating LLM providers from configuration

use std::sync::Arc;

use crate::config::{LLMProviderConfig, LLMProviderKind};
use crate::error::Result;
use crate::llm::providers::{OllamaProvider, OpenAIProvider};
use crate::llm::{LLMProvider, StubProvider};

/// Create an LLM provider from configuration.
///
/// Falls back to the environment for a missing OpenAI API key; when the
/// provider kind is `Stub` every call fails and agents run their
/// degraded paths.
pub fn provider_from_config(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>> {
    match config.provider {
        LLMProviderKind::OpenAI => {
            let model = if config.model.is_empty() {
                None
            } else {
                Some(config.model.clone())
            };
            let provider = match &config.api_key {
                Some(api_key) => match &config.base_url {
                    Some(base_url) => OpenAIProvider::with_base_url(
                        api_key.clone(),
                        model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
                        base_url.clone(),
                    ),
                    None => OpenAIProvider::new(
                        api_key.clone(),
                        model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
                    ),
                },
                None => OpenAIProvider::from_env(model)?,
            };
            Ok(Arc::new(provider))
        }
        LLMProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(
            if config.model.is_empty() {
                "llama3".to_string()
            } else {
                config.model.clone()
            },
            config.base_url.clone(),
        ))),
        LLMProviderKind::Stub => Ok(Arc::new(StubProvider)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_provider_from_config() {
        let config = LLMProviderConfig {
            provider: LLMProviderKind::Stub,
            model: String::new(),
            api_key: None,
            base_url: None,
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.model_info().provider, "stub");
    }

    #[test]
    fn test_openai_provider_with_key() {
        let config = LLMProviderConfig {
            provider: LLMProviderKind::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: None,
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.model_info().provider, "openai");
    }
}
