//! Question-answering pipeline

pub mod context;
pub mod orchestrator;

pub use context::{build_index, RagContext};
pub use orchestrator::{passes_filters, AnswerOrchestrator};
