//! Model-pinned embedding cache with a lazily constructed inner provider

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};

use super::embedding::{prepare_text, EmbeddingProvider};

type ProviderFactory = Box<dyn Fn() -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

/// Memoizes embeddings keyed by `sha256(model || text)`.
///
/// The inner provider is built on first use behind a single initialization
/// barrier; concurrent first callers wait for the same construction.
pub struct CachedEmbedder {
    inner: OnceCell<Arc<dyn EmbeddingProvider>>,
    factory: ProviderFactory,
    model: String,
    dimensions: usize,
    cache: DashMap<String, Arc<Vec<f32>>>,
    capacity: usize,
}

impl CachedEmbedder {
    /// Wrap an already constructed provider
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        let model = inner.model().to_string();
        let dimensions = inner.dimensions();
        let cell = OnceCell::new_with(Some(Arc::clone(&inner)));

        Self {
            inner: cell,
            factory: Box::new(move || -> Result<Arc<dyn EmbeddingProvider>> {
                Ok(Arc::clone(&inner))
            }),
            model,
            dimensions,
            cache: DashMap::new(),
            capacity,
        }
    }

    /// Defer provider construction until the first embedding is requested
    pub fn lazy<F>(model: impl Into<String>, dimensions: usize, capacity: usize, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
    {
        Self {
            inner: OnceCell::new(),
            factory: Box::new(factory),
            model: model.into(),
            dimensions,
            cache: DashMap::new(),
            capacity,
        }
    }

    /// Number of cached embeddings
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Whether the inner provider has been constructed
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }

    async fn provider(&self) -> Result<&Arc<dyn EmbeddingProvider>> {
        self.inner
            .get_or_try_init(|| async {
                tracing::info!("Initializing embedding provider for model '{}'", self.model);
                (self.factory)()
            })
            .await
    }

    fn cache_key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn remember(&self, key: String, embedding: &[f32]) {
        if self.cache.len() < self.capacity {
            self.cache.insert(key, Arc::new(embedding.to_vec()));
        }
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = prepare_text(text)?;
        let key = self.cache_key(text);

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.value().to_vec());
        }

        let embedding = self.provider().await?.embed(text).await?;
        self.remember(key, &embedding);
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut misses = Vec::new();
        let mut miss_slots = Vec::new();

        for (slot, text) in texts.iter().enumerate() {
            let text = prepare_text(text)?;
            match self.cache.get(&self.cache_key(text)) {
                Some(hit) => results.push(Some(hit.value().to_vec())),
                None => {
                    results.push(None);
                    misses.push(text.to_string());
                    miss_slots.push(slot);
                }
            }
        }

        if !misses.is_empty() {
            tracing::debug!("Embedding {} uncached texts of {}", misses.len(), texts.len());
            let embedded = self.provider().await?.embed_batch(&misses).await?;

            for ((slot, text), embedding) in miss_slots.into_iter().zip(&misses).zip(embedded) {
                self.remember(self.cache_key(text), &embedding);
                results[slot] = Some(embedding);
            }
        }

        results
            .into_iter()
            .map(|r| {
                r.ok_or_else(|| Error::embedding("Provider returned too few embeddings"))
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.provider().await?.health_check().await
    }

    fn name(&self) -> &str {
        "cached"
    }
}
