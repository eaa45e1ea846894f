//! Vector store provider trait backing the ingest/query gateway

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::VectorMatch;

/// Payload stored alongside a vector
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Raw text
    pub text: String,
    /// Metadata serialized as a string
    pub meta: String,
}

impl From<StoredObject> for VectorMatch {
    fn from(obj: StoredObject) -> Self {
        Self {
            text: obj.text,
            meta: obj.meta,
        }
    }
}

/// Trait for durable vector storage and near-vector search
///
/// Implementations:
/// - `WeaviateStore`: Weaviate REST + GraphQL
/// - `InMemoryVectorStore`: Process-local cosine store
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create the collection if it does not exist yet
    async fn ensure_schema(&self) -> Result<()>;

    /// Store a vector with its payload
    async fn upsert(&self, id: Uuid, vector: &[f32], payload: &StoredObject) -> Result<()>;

    /// Most similar objects first
    async fn nearest(&self, vector: &[f32], limit: usize) -> Result<Vec<StoredObject>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<()>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
