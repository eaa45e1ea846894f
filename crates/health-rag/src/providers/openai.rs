//! OpenAI-compatible chat completions (OpenAI, Perplexity)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{CompletionRequest, LlmProvider};
use super::retry::retry_request;

/// Chat-completions client for any OpenAI-compatible endpoint
pub struct ChatCompletionsLlm {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    provider: &'static str,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsLlm {
    /// Create a client for the configured backend with an API key
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let provider = match config.backend {
            crate::config::LlmBackend::Perplexity => "perplexity",
            _ => "openai",
        };

        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key,
            model: config.model_name(),
            provider,
            max_retries: config.max_retries,
        })
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(request);
        let (url, body, this) = (url.as_str(), &body, self);

        tracing::debug!("Requesting {} completion with model: {}", self.provider, self.model);

        retry_request(self.max_retries, "Chat completion", || async move {
            let response = this
                .client
                .post(url)
                .bearer_auth(&this.api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| Error::llm(format!("Completion request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "Completion failed: HTTP {} - {}",
                    status, text
                )));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))?;

            chat.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| Error::llm("Completion response had no content"))
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}
