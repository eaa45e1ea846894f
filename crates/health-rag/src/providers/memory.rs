//! In-memory vector store ranked by cosine similarity

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::cosine_similarity;

use super::vector_store::{StoredObject, VectorStoreProvider};

struct Entry {
    id: Uuid,
    vector: Vec<f32>,
    payload: StoredObject,
}

/// Process-local store for tests and single-node runs
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, id: Uuid, vector: &[f32], payload: &StoredObject) -> Result<()> {
        let mut entries = self.entries.write();

        if let Some(first) = entries.iter().find(|e| e.id != id) {
            if first.vector.len() != vector.len() {
                return Err(Error::vector_db(format!(
                    "dimension mismatch: expected {}, got {}",
                    first.vector.len(),
                    vector.len()
                )));
            }
        }

        let entry = Entry {
            id,
            vector: vector.to_vec(),
            payload: payload.clone(),
        };

        match entries.iter_mut().find(|e| e.id == id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn nearest(&self, vector: &[f32], limit: usize) -> Result<Vec<StoredObject>> {
        let entries = self.entries.read();

        let mut scored: Vec<(f32, &Entry)> = entries
            .iter()
            .filter(|e| e.vector.len() == vector.len())
            .map(|e| (cosine_similarity(vector, &e.vector), e))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, e)| e.payload.clone())
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(text: &str) -> StoredObject {
        StoredObject {
            text: text.to_string(),
            meta: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_nearest_by_cosine() {
        let store = InMemoryVectorStore::new();
        store.upsert(Uuid::new_v4(), &[1.0, 0.0], &object("east")).await.unwrap();
        store.upsert(Uuid::new_v4(), &[0.0, 1.0], &object("north")).await.unwrap();
        store.upsert(Uuid::new_v4(), &[0.7, 0.7], &object("north-east")).await.unwrap();

        // Magnitude does not matter for cosine
        let results = store.nearest(&[10.0, 1.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "east");
        assert_eq!(results[1].text, "north-east");
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let store = InMemoryVectorStore::new();
        let id = Uuid::new_v4();
        store.upsert(id, &[1.0, 0.0], &object("old")).await.unwrap();
        store.upsert(id, &[1.0, 0.0], &object("new")).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.nearest(&[1.0, 0.0], 10).await.unwrap()[0].text, "new");
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = InMemoryVectorStore::new();
        store.upsert(Uuid::new_v4(), &[1.0, 0.0], &object("a")).await.unwrap();
        let err = store
            .upsert(Uuid::new_v4(), &[1.0, 0.0, 0.0], &object("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
    }
}
