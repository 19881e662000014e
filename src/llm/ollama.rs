//! Ollama-compatible chat client
//!
//! Non-streaming chat completion over POST /api/chat, plus JSON-format
//! constrained decoding for routing classification. Upstream failures map
//! to `ChatError::Upstream` and are never retried here; retry policy
//! belongs to the endpoint's own configuration.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::prompts::router_prompt;
use crate::errors::{ChatError, Result};
use crate::llm::{parse_model_name, ChatModel, ModelProvider};
use crate::state::Route;
use crate::types::{ChatMessage, MessageRole};

/// Default chat endpoint
pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:11434";

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Sampling temperature for generation
const TEMPERATURE: f64 = 0.2;

/// Ollama chat client
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaChat {
    /// Create a client for the given endpoint and model tag
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ChatError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }

    /// Get current model tag
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, messages: &[ChatMessage], json_format: bool) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let request = OllamaChatRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            format: json_format.then(|| "json".to_string()),
            options: OllamaOptions {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to send chat request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Upstream(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to parse chat response: {}", e)))?;

        Ok(body.message.content)
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
        let content = self.chat(messages, false).await?;
        Ok(ChatMessage {
            role: MessageRole::Assistant,
            content,
        })
    }

    async fn classify_route(&self, query: &str) -> Result<Route> {
        let messages = router_prompt(query);
        let raw = self.chat(&messages, true).await?;

        // Constrained JSON output: {"route": "retrieve" | "direct"}.
        // Anything the parser cannot certify as "direct" resolves to
        // retrieve -- the safe side of the routing policy.
        let route = serde_json::from_str::<RouteSchema>(&raw)
            .ok()
            .and_then(|schema| Route::parse(schema.route.trim()).ok())
            .unwrap_or(Route::Retrieve);

        Ok(route)
    }
}

/// Routing schema for structured output
#[derive(Debug, Deserialize)]
struct RouteSchema {
    route: String,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Model factory backed by the chat endpoint.
///
/// Validates `provider/model-name` identifiers against the allow-list and
/// serves every provider through the configured endpoint; the provider
/// segment selects the allow-list entry, the model segment selects the
/// served tag.
pub struct HttpModelProvider {
    base_url: String,
}

impl HttpModelProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl ModelProvider for HttpModelProvider {
    fn load(&self, name: &str) -> Result<Arc<dyn ChatModel>> {
        let parsed = parse_model_name(name)?;
        let client = OllamaChat::with_config(&self.base_url, &parsed.model)?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaChat::with_config(DEFAULT_CHAT_URL, "qwen2.5:7b-instruct");
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.model(), "qwen2.5:7b-instruct");
        assert_eq!(client.base_url(), DEFAULT_CHAT_URL);
    }

    #[test]
    fn test_provider_rejects_unknown_provider() {
        let provider = HttpModelProvider::new(DEFAULT_CHAT_URL);
        assert!(provider.load("nonsense/model").is_err());
        assert!(provider.load("ollama/qwen2.5:7b-instruct").is_ok());
    }

    #[test]
    fn test_route_schema_parsing() {
        let schema: RouteSchema = serde_json::from_str(r#"{"route": "direct"}"#).unwrap();
        assert_eq!(schema.route, "direct");
    }
}
