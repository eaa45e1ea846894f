//! Explicitly constructed, read-only pipeline context

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::{QueryRewriter, SelfRagEvaluator};
use crate::ingestion::{DocumentBuilder, RecordNormalizer};
use crate::providers::{with_timeout, EmbeddingProvider, LlmProvider};
use crate::retrieval::{l2_normalize, FlatIndex};
use crate::types::Chunk;

/// Everything a question needs, built once at startup and shared read-only.
///
/// Embeddings stored in the index are L2-normalized when
/// `embeddings.normalize` is set; queries are normalized the same way.
pub struct RagContext {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    index: FlatIndex,
    rewriter: QueryRewriter,
    evaluator: SelfRagEvaluator,
}

impl RagContext {
    /// Assemble a context around an already built index
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: FlatIndex,
    ) -> Self {
        let rewriter = QueryRewriter::new(Arc::clone(&llm), &config.llm);
        let evaluator = SelfRagEvaluator::new(Arc::clone(&llm), &config.llm);

        Self {
            config,
            embedder,
            llm,
            index,
            rewriter,
            evaluator,
        }
    }

    /// Normalize records, build chunks, embed them and write the index file
    pub async fn build(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let index = build_index(&config, embedder.as_ref()).await?;
        index.save(&config.vector_db.index_path)?;

        Ok(Self::new(config, embedder, llm, index))
    }

    /// Configuration the context was built with
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Flat index over every chunk
    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// HyDE rewriter
    pub fn rewriter(&self) -> &QueryRewriter {
        &self.rewriter
    }

    /// Self-evaluating answerer
    pub fn evaluator(&self) -> &SelfRagEvaluator {
        &self.evaluator
    }

    /// Embed query text using the index's normalization convention
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = with_timeout(
            self.config.embeddings.timeout(),
            "Query embedding",
            self.embedder.embed(text),
        )
        .await?;

        if self.config.embeddings.normalize {
            l2_normalize(&mut embedding);
        }
        Ok(embedding)
    }
}

/// Run normalization, document building and embedding into a fresh index
pub async fn build_index(config: &RagConfig, embedder: &dyn EmbeddingProvider) -> Result<FlatIndex> {
    let records = RecordNormalizer::from_config(&config.data).normalize()?;
    let chunks = DocumentBuilder::from_config(&config.chunking).build_all(&records);

    let embeddings = embed_chunks(config, embedder, &chunks).await?;
    FlatIndex::build(embedder.dimensions(), embeddings, chunks)
}

async fn embed_chunks(
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
    chunks: &[Chunk],
) -> Result<Vec<Vec<f32>>> {
    let batch_size = config.embeddings.batch_size.max(1);
    let mut embeddings = Vec::with_capacity(chunks.len());

    for (n, batch) in chunks.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let mut vectors = with_timeout(
            config.embeddings.timeout(),
            "Chunk embedding",
            embedder.embed_batch(&texts),
        )
        .await?;

        if config.embeddings.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize(v));
        }
        embeddings.extend(vectors);

        tracing::debug!(
            "Embedded batch {} ({}/{} chunks)",
            n + 1,
            embeddings.len(),
            chunks.len()
        );
    }

    Ok(embeddings)
}
