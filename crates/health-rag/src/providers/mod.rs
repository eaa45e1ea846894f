//! Provider abstractions for embeddings, LLM and vector storage
//!
//! Trait-based seams let the pipeline run against Ollama, OpenAI-compatible
//! APIs or Weaviate in production and against in-process stubs in tests.

pub mod cache;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod vector_store;
pub mod weaviate;

use std::sync::Arc;

use crate::config::{LlmBackend, RagConfig, StoreBackend};
use crate::error::Result;

pub use cache::CachedEmbedder;
pub use embedding::{prepare_text, EmbeddingProvider};
pub use llm::{CompletionRequest, LlmProvider};
pub use memory::InMemoryVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use openai::ChatCompletionsLlm;
pub use retry::{retry_request, with_timeout};
pub use vector_store::{StoredObject, VectorStoreProvider};
pub use weaviate::WeaviateStore;

/// Cached Ollama embedder; the HTTP client is built on first use
pub fn build_embedder(config: &RagConfig) -> Arc<dyn EmbeddingProvider> {
    let embeddings = config.embeddings.clone();

    Arc::new(CachedEmbedder::lazy(
        embeddings.model.clone(),
        embeddings.dimensions,
        embeddings.cache_capacity,
        move || Ok(Arc::new(OllamaEmbedder::new(&embeddings)?) as Arc<dyn EmbeddingProvider>),
    ))
}

/// LLM for the configured backend, resolving API keys from the environment
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        LlmBackend::OpenAi | LlmBackend::Perplexity => {
            let api_key = config.llm.api_key()?.unwrap_or_default();
            Arc::new(ChatCompletionsLlm::new(&config.llm, api_key)?)
        }
    };

    tracing::info!("Using LLM provider '{}' (model {})", llm.name(), llm.model());
    Ok(llm)
}

/// Vector store backing the gateway
pub fn build_vector_store(config: &RagConfig) -> Result<Arc<dyn VectorStoreProvider>> {
    let store: Arc<dyn VectorStoreProvider> = match config.gateway.store {
        StoreBackend::Weaviate => Arc::new(WeaviateStore::new(&config.vector_db)?),
        StoreBackend::Memory => Arc::new(InMemoryVectorStore::new()),
    };

    tracing::info!("Using vector store '{}'", store.name());
    Ok(store)
}
