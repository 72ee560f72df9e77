//! Gateways to the OpenAI-compatible HTTP API.
//!
//! Two operations, one client:
//! - `embeddings`: batch text embedding for ingestion and queries
//! - `chat`: chat completion producing the final answer
//!
//! Both are single-shot calls with no retry; any transport, auth, or
//! payload failure surfaces to the pipeline and aborts it.

pub mod chat;
pub mod embeddings;

pub use chat::CompletionError;
pub use embeddings::EmbeddingError;

/// Shared handle for the embedding and completion endpoints.
pub struct OpenAi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
}

impl OpenAi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        embedding_model: impl Into<String>,
        chat_model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
            chat_model: chat_model.into(),
        }
    }
}
