//! Answer orchestrator: rewrite, embed, retrieve, filter, respond, project

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::prompt::{PromptBuilder, ANSWER_SYSTEM};
use crate::providers::{with_timeout, CompletionRequest};
use crate::types::{AskRequest, AskResponse, Chunk, SourceDocument};

use super::context::RagContext;

/// Runs one question through the pipeline.
///
/// Stages run strictly in order and any failure aborts the request; no
/// partial answer is ever returned.
#[derive(Clone)]
pub struct AnswerOrchestrator {
    context: Arc<RagContext>,
}

impl AnswerOrchestrator {
    /// Create an orchestrator over a built context
    pub fn new(context: Arc<RagContext>) -> Self {
        Self { context }
    }

    /// Shared context
    pub fn context(&self) -> &Arc<RagContext> {
        &self.context
    }

    /// Answer a question
    pub async fn answer(&self, request: &AskRequest) -> Result<AskResponse> {
        let start = Instant::now();
        let question = request.question.trim();
        if question.is_empty() {
            return Err(Error::invalid_input("question must not be empty"));
        }

        tracing::info!(
            "Question: \"{}\" (hyde={}, self_rag={})",
            question,
            request.use_hyde,
            request.use_self_rag
        );

        let query_text = self
            .context
            .rewriter()
            .rewrite(question, request.use_hyde)
            .await?;

        let query = self.context.embed_query(&query_text).await?;

        let top_k = self.context.config().retrieval.top_k;
        let retrieved: Vec<&Chunk> = self
            .context
            .index()
            .search(&query, top_k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect();

        let retrieved_count = retrieved.len();
        let chunks: Vec<Chunk> = retrieved
            .into_iter()
            .filter(|chunk| passes_filters(chunk, request))
            .cloned()
            .collect();

        tracing::debug!(
            "Retrieved {} chunks, {} after filtering",
            retrieved_count,
            chunks.len()
        );

        let (answer, evaluation) = if request.use_self_rag {
            let result = self.context.evaluator().evaluate(question, &chunks).await?;
            let evaluation = result.evaluation();
            (result.answer, Some(evaluation))
        } else {
            (self.answer_plain(question, &chunks).await?, None)
        };

        let preview_chars = self.context.config().retrieval.preview_chars;
        let source_documents = chunks
            .iter()
            .map(|chunk| SourceDocument::from_chunk(chunk, preview_chars))
            .collect();

        tracing::info!(
            "Answered in {}ms from {} source documents",
            start.elapsed().as_millis(),
            chunks.len()
        );

        Ok(AskResponse {
            answer,
            source_documents,
            self_rag_evaluation: evaluation,
        })
    }

    /// Single completion over the concatenated chunk text
    async fn answer_plain(&self, question: &str, chunks: &[Chunk]) -> Result<String> {
        let config = &self.context.config().llm;
        let request = CompletionRequest::new(
            ANSWER_SYSTEM,
            PromptBuilder::build_answer_prompt(question, chunks),
            config.answer_temperature,
        );

        with_timeout(config.timeout(), "Answer", self.context.llm().complete(&request)).await
    }
}

/// Exact fitness-level match and goal-label membership; empty filters are ignored
pub fn passes_filters(chunk: &Chunk, request: &AskRequest) -> bool {
    let level_ok = match request.fitness_level.as_deref().filter(|l| !l.is_empty()) {
        Some(level) => chunk.metadata.fitness_level.as_str() == level,
        None => true,
    };

    let goal_ok = match request.goal.as_deref().filter(|g| !g.is_empty()) {
        Some(goal) => chunk.metadata.matches_goal(goal),
        None => true,
    };

    level_ok && goal_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, FitnessLevel};

    fn chunk(level: FitnessLevel, goals: &[&str]) -> Chunk {
        Chunk::new(
            "summary",
            ChunkMetadata {
                user_id: "u1".to_string(),
                fitness_level: level,
                goals: goals.iter().map(|g| g.to_string()).collect(),
                bmi: None,
            },
            0,
        )
    }

    #[test]
    fn test_no_filters_pass_everything() {
        let request = AskRequest::new("q");
        assert!(passes_filters(&chunk(FitnessLevel::Beginner, &[]), &request));
    }

    #[test]
    fn test_fitness_level_is_exact() {
        let request = AskRequest::new("q").with_fitness_level("advanced");
        assert!(passes_filters(&chunk(FitnessLevel::Advanced, &["strength"]), &request));
        assert!(!passes_filters(&chunk(FitnessLevel::Intermediate, &["strength"]), &request));

        let upper = AskRequest::new("q").with_fitness_level("Advanced");
        assert!(!passes_filters(&chunk(FitnessLevel::Advanced, &["strength"]), &upper));
    }

    #[test]
    fn test_goal_must_be_one_of_the_labels() {
        let request = AskRequest::new("q").with_goal("endurance");
        assert!(passes_filters(
            &chunk(FitnessLevel::Beginner, &["strength", "endurance"]),
            &request
        ));
        assert!(!passes_filters(&chunk(FitnessLevel::Beginner, &["strength"]), &request));

        let partial = AskRequest::new("q").with_goal("e");
        assert!(!passes_filters(
            &chunk(FitnessLevel::Beginner, &["strength", "endurance"]),
            &partial
        ));
    }

    #[test]
    fn test_both_filters_must_hold() {
        let request = AskRequest::new("q")
            .with_fitness_level("advanced")
            .with_goal("strength");
        assert!(passes_filters(&chunk(FitnessLevel::Advanced, &["strength"]), &request));
        assert!(!passes_filters(&chunk(FitnessLevel::Advanced, &["flexibility"]), &request));
        assert!(!passes_filters(&chunk(FitnessLevel::Beginner, &["strength"]), &request));
    }

    #[test]
    fn test_empty_filter_strings_are_ignored() {
        let request = AskRequest::new("q").with_fitness_level("").with_goal("");
        assert!(passes_filters(&chunk(FitnessLevel::Unknown, &[]), &request));
    }
}
