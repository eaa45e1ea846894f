//! health-rag: retrieval-augmented question answering over health and fitness records
//!
//! Raw JSON, CSV and wearable exports are merged into one record per user,
//! summarized, chunked and embedded into an exact flat index. Questions can be
//! rewritten into hypothetical documents before retrieval, and answers can
//! carry the model's own assessment of its evidence. A separate gateway
//! stores and queries arbitrary vectors in Weaviate.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{AnswerOrchestrator, RagContext};
pub use retrieval::FlatIndex;
pub use types::{
    document::{Chunk, ChunkMetadata, FitnessLevel},
    query::AskRequest,
    record::UserRecord,
    response::{AskResponse, SelfRagResult},
};
