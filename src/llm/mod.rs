//! Generation capability: chat model trait and provider resolution
//!
//! A model is configured by an identifier of the form `provider/model-name`
//! (or just `provider`), validated against a fixed allow-list. The
//! orchestrator only ever sees the `ChatModel` trait; the concrete client
//! lives in `ollama`.

pub mod ollama;

use async_trait::async_trait;

use crate::errors::{ChatError, Result};
use crate::state::Route;
use crate::types::ChatMessage;

pub use ollama::OllamaChat;

/// Model providers accepted in `provider/model-name` identifiers.
pub const SUPPORTED_PROVIDERS: &[&str] = &[
    "openai",
    "anthropic",
    "azure_openai",
    "cohere",
    "google-vertexai",
    "google-vertexai-web",
    "google-genai",
    "ollama",
    "together",
    "fireworks",
    "mistralai",
    "groq",
    "bedrock",
    "cerebras",
    "deepseek",
    "xai",
];

/// Text-generation capability consumed by the orchestrator.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Invoke the model with a full message history
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage>;

    /// Classify a query into a routing decision with constrained output.
    ///
    /// Implementations must be total over the `Route` enum: when the
    /// model's raw output is ambiguous or malformed, the documented
    /// policy is always prefer retrieve.
    async fn classify_route(&self, query: &str) -> Result<Route>;
}

/// A parsed `provider/model-name` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub provider: String,
    pub model: String,
}

/// Parse and validate a fully specified model name.
///
/// Accepts `provider/model-name`, `provider/account/model-name` or a bare
/// provider name; an unknown provider fails with a configuration error.
pub fn parse_model_name(fully_specified_name: &str) -> Result<ModelName> {
    let (provider, model) = match fully_specified_name.split_once('/') {
        Some((provider, model)) => (provider, model),
        None => (fully_specified_name, fully_specified_name),
    };

    if !SUPPORTED_PROVIDERS.contains(&provider) {
        return Err(ChatError::Configuration(format!(
            "Unsupported provider: {}",
            provider
        )));
    }

    Ok(ModelName {
        provider: provider.to_string(),
        model: model.to_string(),
    })
}

/// Factory for chat models, injected into the orchestrator so tests can
/// substitute scripted models.
pub trait ModelProvider: Send + Sync {
    /// Load (or reuse) a model for the given identifier
    fn load(&self, name: &str) -> Result<std::sync::Arc<dyn ChatModel>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_and_model() {
        let name = parse_model_name("openai/gpt-4o").unwrap();
        assert_eq!(name.provider, "openai");
        assert_eq!(name.model, "gpt-4o");
    }

    #[test]
    fn test_parse_nested_model_path() {
        let name = parse_model_name("ollama/library/qwen2.5:7b").unwrap();
        assert_eq!(name.provider, "ollama");
        assert_eq!(name.model, "library/qwen2.5:7b");
    }

    #[test]
    fn test_parse_bare_provider() {
        let name = parse_model_name("anthropic").unwrap();
        assert_eq!(name.provider, "anthropic");
    }

    #[test]
    fn test_unsupported_provider_is_configuration_error() {
        let err = parse_model_name("madeup/model").unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
        assert!(err.to_string().contains("madeup"));

        assert!(parse_model_name("gpt-4o").is_err());
    }
}
