//! Chat-completion client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use argo_common::{ArgoError, ArgoResult};

/// Configuration for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
}

impl ChatConfig {
    /// Read configuration from the environment. A missing API key is
    /// unrecoverable configuration and surfaces as an error.
    pub fn from_env() -> ArgoResult<Self> {
        let api_key = std::env::var("ARGO_LLM_API_KEY")
            .map_err(|_| ArgoError::InvalidConfig("ARGO_LLM_API_KEY is not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("ARGO_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key,
            model: std::env::var("ARGO_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout: Duration::from_secs(60),
            temperature: 0.3,
        })
    }
}

/// Client for a hosted chat-completion API.
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl ChatClient {
    /// Create a client with the given configuration.
    pub fn new(config: ChatConfig) -> ArgoResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ArgoError::ModelApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Model name in use.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Single chat completion. One request, no retries.
    pub async fn complete(&self, system: &str, user: &str) -> ArgoResult<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArgoError::ModelApi(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ArgoError::ModelApi(format!(
                "Chat API returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ArgoError::ModelApi(format!("Failed to parse chat response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ArgoError::ModelApi("Chat API returned no choices".to_string()))
    }

    /// Complete, substituting `fallback` on any API failure. Used where a
    /// model outage must not abort the surrounding run.
    pub async fn complete_or_fallback(&self, system: &str, user: &str, fallback: String) -> String {
        match self.complete(system, user).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Chat API failed, substituting fallback text");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "test-model",
            messages: vec![
                Message {
                    role: "system",
                    content: "be brief",
                },
                Message {
                    role: "user",
                    content: "hello",
                },
            ],
            temperature: 0.3,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_parse() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"two lines\nof text"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "two lines\nof text");
    }

    #[test]
    fn test_response_parse_no_choices() {
        let body = r#"{"choices":[]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
