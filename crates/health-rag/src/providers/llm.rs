//! LLM provider trait for text completion

use async_trait::async_trait;

use crate::error::Result;

/// A single system + user completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Token cap, provider default when `None`
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with no token cap
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature,
            max_tokens: None,
        }
    }

    /// Cap the completion length
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Trait for LLM text completion
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (phi3, llama3, etc.)
/// - `ChatCompletionsLlm`: OpenAI-compatible chat completions (OpenAI, Perplexity)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
