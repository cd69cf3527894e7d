//! Embedding client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use argo_common::{ArgoError, ArgoResult};

/// Configuration for the embedding endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Expected vector width; responses of any other width are rejected.
    pub dim: usize,
    pub timeout: Duration,
}

impl EmbeddingConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> ArgoResult<Self> {
        let api_key = std::env::var("ARGO_EMBED_API_KEY")
            .or_else(|_| std::env::var("ARGO_LLM_API_KEY"))
            .map_err(|_| {
                ArgoError::InvalidConfig(
                    "ARGO_EMBED_API_KEY / ARGO_LLM_API_KEY is not set".to_string(),
                )
            })?;

        let dim = match std::env::var("ARGO_EMBED_DIM") {
            Ok(text) => text
                .parse()
                .map_err(|_| ArgoError::InvalidConfig(format!("Bad ARGO_EMBED_DIM: {}", text)))?,
            Err(_) => 384,
        };

        Ok(Self {
            base_url: std::env::var("ARGO_EMBED_BASE_URL")
                .or_else(|_| std::env::var("ARGO_LLM_BASE_URL"))
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key,
            model: std::env::var("ARGO_EMBED_MODEL")
                .unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string()),
            dim,
            timeout: Duration::from_secs(60),
        })
    }
}

/// Client for a hosted embedding API.
pub struct EmbeddingClient {
    client: Client,
    config: EmbeddingConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a client with the given configuration.
    pub fn new(config: EmbeddingConfig) -> ArgoResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArgoError::ModelApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Configured vector dimension.
    pub fn dim(&self) -> usize {
        self.config.dim
    }

    /// Embed a batch of texts. Results come back in input order; the
    /// response's own index field is authoritative and is re-sorted.
    pub async fn embed(&self, texts: &[String]) -> ArgoResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArgoError::ModelApi(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ArgoError::ModelApi(format!(
                "Embedding API returned {}",
                response.status()
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ArgoError::ModelApi(format!("Failed to parse embedding response: {}", e))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(ArgoError::ModelApi(format!(
                "Embedding API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        parsed.data.sort_by_key(|entry| entry.index);

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for entry in parsed.data {
            if entry.embedding.len() != self.config.dim {
                return Err(ArgoError::EmbeddingDimension {
                    expected: self.config.dim,
                    actual: entry.embedding.len(),
                });
            }
            vectors.push(entry.embedding);
        }

        debug!(count = vectors.len(), dim = self.config.dim, "Embedded batch");
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let request = EmbeddingRequest {
            model: "all-MiniLM-L6-v2",
            input: &texts,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "all-MiniLM-L6-v2");
        assert_eq!(value["input"][1], "b");
    }

    #[test]
    fn test_response_parse_and_order() {
        let body = r#"{"data":[
            {"index":1,"embedding":[0.5,0.6]},
            {"index":0,"embedding":[0.1,0.2]}
        ]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        parsed.data.sort_by_key(|e| e.index);
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
        assert_eq!(parsed.data[1].embedding, vec![0.5, 0.6]);
    }
}
