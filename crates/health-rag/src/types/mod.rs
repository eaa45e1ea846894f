//! Core types for the health RAG system

pub mod document;
pub mod query;
pub mod record;
pub mod response;

pub use document::{Chunk, ChunkMetadata, DerivedAttributes, FitnessLevel};
pub use query::{AskRequest, IngestRequest, VectorQueryRequest};
pub use record::{DataIssue, UserRecord, DATA_SOURCE_KEY};
pub use response::{
    AskResponse, GatewayHealth, HealthResponse, IngestResponse, SelfRagEvaluation,
    SelfRagResult, SourceDocument, VectorMatch, VectorQueryResponse,
};
