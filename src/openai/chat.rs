use serde::{Deserialize, Serialize};

use super::OpenAi;

/// Fixed persona instruction. The assembled note context rides in a second
/// system message; the user's question is the only user message.
const PERSONA: &str = "You are the user's second brain. You will be given a \
passage of text drawn from the user's own notes, then a question. Answer the \
question using only the information in that passage; if the passage does not \
contain the answer, say so instead of guessing.";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAi {
    /// Ask the chat model to answer `question` from `context`. Returns the
    /// first completion's text. Default sampling settings, no streaming.
    pub async fn answer(
        &self,
        context: &str,
        question: &str,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: PERSONA,
                },
                ChatMessage {
                    role: "system",
                    content: context,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(CompletionError::Api { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices returned".to_string()))
    }
}
