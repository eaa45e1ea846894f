//! Self-evaluating answer generation

use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::providers::{with_timeout, CompletionRequest, LlmProvider};
use crate::types::{Chunk, SelfRagResult};

use super::prompt::{PromptBuilder, SELF_RAG_SYSTEM};

/// Turns a raw model reply into the four-field evaluation.
///
/// Parsing never fails: a reply that ignores the requested structure yields
/// whatever the parser reads from it.
pub trait EvaluationParser: Send + Sync {
    /// Parse a model reply
    fn parse(&self, response: &str) -> SelfRagResult;
}

/// Reads the reply by line position.
///
/// Lines 1-3 answer the three yes/no questions (a line is "yes" when it
/// contains `yes` in any case, a missing line is "no") and the last line is
/// the answer, taken verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePositionParser;

impl LinePositionParser {
    fn is_yes(line: Option<&str>) -> bool {
        line.map(|l| l.to_lowercase().contains("yes"))
            .unwrap_or(false)
    }
}

impl EvaluationParser for LinePositionParser {
    fn parse(&self, response: &str) -> SelfRagResult {
        let lines: Vec<&str> = response.split('\n').collect();

        SelfRagResult {
            needs_retrieval: Self::is_yes(lines.first().copied()),
            sufficient_info: Self::is_yes(lines.get(1).copied()),
            has_hallucination: Self::is_yes(lines.get(2).copied()),
            answer: lines.last().copied().unwrap_or_default().to_string(),
        }
    }
}

/// Asks the model to judge its evidence while answering
pub struct SelfRagEvaluator {
    llm: Arc<dyn LlmProvider>,
    parser: Box<dyn EvaluationParser>,
    temperature: f32,
    timeout: Duration,
}

impl SelfRagEvaluator {
    /// Create an evaluator with the line-position parser
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self::with_parser(llm, config, Box::new(LinePositionParser))
    }

    /// Create an evaluator with a custom reply parser
    pub fn with_parser(
        llm: Arc<dyn LlmProvider>,
        config: &LlmConfig,
        parser: Box<dyn EvaluationParser>,
    ) -> Self {
        Self {
            llm,
            parser,
            temperature: config.self_rag_temperature,
            timeout: config.timeout(),
        }
    }

    /// Answer `question` from `chunks` (ranked order) with self-assessment
    pub async fn evaluate(&self, question: &str, chunks: &[Chunk]) -> Result<SelfRagResult> {
        let request = CompletionRequest::new(
            SELF_RAG_SYSTEM,
            PromptBuilder::build_self_rag_prompt(question, chunks),
            self.temperature,
        );

        let response =
            with_timeout(self.timeout, "Self-evaluation", self.llm.complete(&request)).await?;
        let result = self.parser.parse(&response);

        tracing::debug!(
            "Self-evaluation over {} chunks: needs_retrieval={}, sufficient_info={}, has_hallucination={}",
            chunks.len(),
            result.needs_retrieval,
            result.sufficient_info,
            result.has_hallucination
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_parse_four_line_reply() {
        let result = LinePositionParser.parse("No\nYes\nNo\nFinal answer text");

        assert!(!result.needs_retrieval);
        assert!(result.sufficient_info);
        assert!(!result.has_hallucination);
        assert_eq!(result.answer, "Final answer text");
    }

    #[test]
    fn test_parse_is_case_insensitive_substring() {
        let result = LinePositionParser.parse("1. YES, more data\n2. yes.\n3. Yes\n4. Sleep 8h.");

        assert!(result.needs_retrieval);
        assert!(result.sufficient_info);
        assert!(result.has_hallucination);
        assert_eq!(result.answer, "4. Sleep 8h.");
    }

    #[test]
    fn test_parse_short_reply() {
        let result = LinePositionParser.parse("Yes");
        assert!(result.needs_retrieval);
        assert!(!result.sufficient_info);
        assert!(!result.has_hallucination);
        assert_eq!(result.answer, "Yes");

        let empty = LinePositionParser.parse("");
        assert!(!empty.needs_retrieval);
        assert_eq!(empty.answer, "");
    }

    #[test]
    fn test_trailing_newline_leaves_empty_answer() {
        let result = LinePositionParser.parse("No\nYes\nNo\nAnswer\n");
        assert_eq!(result.answer, "");
    }

    #[tokio::test]
    async fn test_evaluate_uses_parser() {
        let evaluator = SelfRagEvaluator::new(
            Arc::new(CannedLlm("No\nYes\nNo\nFinal answer text")),
            &LlmConfig::default(),
        );

        let result = evaluator.evaluate("Q?", &[]).await.unwrap();
        assert_eq!(result.answer, "Final answer text");
        assert!(result.sufficient_info);
    }

    #[tokio::test]
    async fn test_custom_parser() {
        struct AlwaysSufficient;

        impl EvaluationParser for AlwaysSufficient {
            fn parse(&self, response: &str) -> SelfRagResult {
                SelfRagResult {
                    answer: response.trim().to_string(),
                    needs_retrieval: false,
                    sufficient_info: true,
                    has_hallucination: false,
                }
            }
        }

        let evaluator = SelfRagEvaluator::with_parser(
            Arc::new(CannedLlm("  plain reply  ")),
            &LlmConfig::default(),
            Box::new(AlwaysSufficient),
        );

        let result = evaluator.evaluate("Q?", &[]).await.unwrap();
        assert_eq!(result.answer, "plain reply");
        assert!(result.sufficient_info);
    }
}
