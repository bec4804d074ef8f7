//! Text-completion provider abstraction.
//!
//! The query interpreter and both answer-synthesis paths send a single prompt
//! and use the returned text verbatim.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a completion provider.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network or API communication error
    #[error("API request failed: {0}")]
    ApiError(String),

    /// The service answered without usable text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for completion operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Trait for text-completion providers.
///
/// Implementors take one self-contained prompt (no conversation history) and
/// return the model's reply. The trait is async to support API-based services.
///
/// # Example Usage
/// ```ignore
/// let completion = OpenAICompletion::new(&config, reqwest::Client::new());
/// let expression = completion.complete(&keyword_prompt(question)).await?;
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a single prompt and return the generated text.
    ///
    /// # Arguments
    /// * `prompt` - The full prompt, instructions included
    ///
    /// # Returns
    /// The generated text, unmodified
    ///
    /// # Errors
    /// Returns `GenerationError` if the request fails or the reply holds no text
    async fn complete(&self, prompt: &str) -> GenerationResult<String>;

    /// Get the model name/identifier for this provider.
    ///
    /// # Returns
    /// A string identifying the chat model (e.g., "gpt-4o-mini")
    fn model_name(&self) -> &str;
}
