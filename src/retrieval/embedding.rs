//! Embedding client for the qdrant provider
//!
//! Embeddings come from the chat endpoint's /api/embeddings route; the
//! memory provider needs no embeddings and never touches this client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{ChatError, Result};

/// Embedding dimension of the default model (nomic-embed-text)
pub const EMBEDDING_DIM: u64 = 768;

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP embedding client
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
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

    /// Generate an embedding for a single text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to send embedding request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ChatError::Upstream(format!(
                "Embedding endpoint returned HTTP {}",
                status
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            ChatError::Upstream(format!("Failed to parse embedding response: {}", e))
        })?;

        Ok(body.embedding)
    }

    /// Generate embeddings for multiple texts
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = EmbeddingClient::new("http://127.0.0.1:11434", "nomic-embed-text");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model(), "nomic-embed-text");
    }
}
