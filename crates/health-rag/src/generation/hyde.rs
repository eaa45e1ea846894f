//! Hypothetical document expansion
//!
//! Instead of embedding the bare question, the LLM writes a plausible,
//! data-styled answer document and that text is embedded. Answer-shaped text
//! sits closer to the stored summaries than question-shaped text does.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::providers::{with_timeout, CompletionRequest, LlmProvider};

use super::prompt::{PromptBuilder, HYDE_SYSTEM};

/// Rewrites questions into hypothetical answer documents
pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl QueryRewriter {
    /// Create a rewriter using the HyDE sampling settings from `config`
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            temperature: config.hyde_temperature,
            max_tokens: config.hyde_max_tokens,
            timeout: config.timeout(),
        }
    }

    /// Completion request for `question`
    pub fn request(&self, question: &str) -> CompletionRequest {
        CompletionRequest::new(
            HYDE_SYSTEM,
            PromptBuilder::build_hyde_prompt(question),
            self.temperature,
        )
        .with_max_tokens(self.max_tokens)
    }

    /// Text to embed for `question`.
    ///
    /// Disabled rewriting returns the question unchanged. LLM failures are
    /// returned as errors rather than falling back to the question.
    pub async fn rewrite<'q>(&self, question: &'q str, enabled: bool) -> Result<Cow<'q, str>> {
        if !enabled {
            return Ok(Cow::Borrowed(question));
        }

        let request = self.request(question);
        let document =
            with_timeout(self.timeout, "Hypothetical document", self.llm.complete(&request))
                .await?;

        tracing::debug!(
            "Rewrote question ({} chars) into hypothetical document ({} chars)",
            question.len(),
            document.len()
        );
        Ok(Cow::Owned(document))
    }
}
