//! Generation module for query rewriting and answering

pub mod hyde;
pub mod prompt;
pub mod self_rag;

pub use hyde::QueryRewriter;
pub use prompt::PromptBuilder;
pub use self_rag::{EvaluationParser, LinePositionParser, SelfRagEvaluator};
