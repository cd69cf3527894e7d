//! Hosted model API clients (chat completions and embeddings).
//!
//! Both clients speak OpenAI-compatible JSON over HTTPS and are configured
//! from the environment. Chat callers that must not abort a batch on a model
//! outage use [`ChatClient::complete_or_fallback`], which substitutes a
//! templated fallback string; API calls are never retried.

pub mod chat;
pub mod embeddings;

pub use chat::{ChatClient, ChatConfig};
pub use embeddings::{EmbeddingClient, EmbeddingConfig};
