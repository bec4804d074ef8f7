//! OpenAI chat-completion provider.

use super::{CompletionProvider, GenerationError, GenerationResult};
use crate::config::{trim_base_url, OpenAIConfig};
use crate::http::{self, HttpError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "OpenAI chat";

/// Completion provider backed by `/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAICompletion {
    api_key: String,
    base_url: String,
    model: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAICompletion {
    /// Create a new chat-completion provider.
    ///
    /// # Arguments
    /// * `config` - API key, endpoint and `completion_model`
    /// * `http_client` - Shared reqwest client
    pub fn new(config: &OpenAIConfig, http_client: Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: trim_base_url(&config.base_url),
            model: config.completion_model.clone(),
            http_client,
        }
    }
}

impl From<HttpError> for GenerationError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Decode { .. } => GenerationError::InvalidResponse(err.to_string()),
            _ => GenerationError::ApiError(err.to_string()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompletion {
    async fn complete(&self, prompt: &str) -> GenerationResult<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model = %self.model, prompt_chars = prompt.len(), "requesting completion");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| HttpError::transport(SERVICE, e))?;

        let body: ChatResponse = http::read_json(response, SERVICE).await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("no completion choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
