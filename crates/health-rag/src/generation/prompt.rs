//! Prompt templates for query rewriting and answering

use crate::types::Chunk;

/// System instruction for hypothetical document generation
pub const HYDE_SYSTEM: &str =
    "You are a health data analyst creating objective, data-focused documents.";

/// System instruction for the self-evaluating answer
pub const SELF_RAG_SYSTEM: &str =
    "You are a precise analytical assistant that only uses provided information.";

/// System instruction for the plain answer
pub const ANSWER_SYSTEM: &str =
    "You are a health analysis assistant. Answer based only on the provided information.";

/// Prompt builder for health questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Ask for a factual document that would answer `question`
    pub fn build_hyde_prompt(question: &str) -> String {
        format!(
            r#"Generate a detailed, factual document that could answer this question: {question}
The document should be written in a formal, objective style and include relevant details that would be found in a health and fitness dataset. Focus on quantitative metrics and specific health indicators."#,
            question = question
        )
    }

    /// Numbered documents with their metadata, in ranked order
    pub fn build_evaluation_context(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "Document {}:\n{}\nMetadata: {}",
                    i + 1,
                    chunk.text,
                    chunk.metadata
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Four-part self-evaluation prompt.
    ///
    /// The reply is read by line position, so the numbered order here is
    /// what [`LinePositionParser`](super::LinePositionParser) expects.
    pub fn build_self_rag_prompt(question: &str, chunks: &[Chunk]) -> String {
        format!(
            r#"Analyze the following question and context, then provide a detailed evaluation:

Context:
{context}

Question: {question}

Please provide:
1. Do we need additional information retrieval? (Yes/No)
2. Is the available information sufficient? (Yes/No)
3. Would answering require any speculation? (Yes/No)
4. Based on the above, provide a precise answer using ONLY the given information."#,
            context = Self::build_evaluation_context(chunks),
            question = question
        )
    }

    /// Concatenated chunk text followed by the question
    pub fn build_answer_prompt(question: &str, chunks: &[Chunk]) -> String {
        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("Context:\n{}\n\nQuestion: {}", context, question)
    }
}
