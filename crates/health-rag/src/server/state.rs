//! Application state for both HTTP surfaces

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::{AnswerOrchestrator, RagContext};
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};

/// Shared state for the question-answering surface.
///
/// The orchestrator is set exactly once, when the background index build
/// finishes; until then the surface reports not ready.
#[derive(Clone)]
pub struct QaState {
    inner: Arc<QaStateInner>,
}

struct QaStateInner {
    /// Configuration
    config: RagConfig,
    /// Orchestrator over the built index
    orchestrator: OnceCell<AnswerOrchestrator>,
}

impl QaState {
    /// Create state with no index yet
    pub fn new(config: RagConfig) -> Self {
        Self {
            inner: Arc::new(QaStateInner {
                config,
                orchestrator: OnceCell::new(),
            }),
        }
    }

    /// Create state that is ready immediately
    pub fn with_context(context: Arc<RagContext>) -> Self {
        let state = Self::new(context.config().clone());
        state.set_context(context);
        state
    }

    /// Install the built context. Returns false if one was already installed.
    pub fn set_context(&self, context: Arc<RagContext>) -> bool {
        let chunks = context.index().len();
        let installed = self
            .inner
            .orchestrator
            .set(AnswerOrchestrator::new(context))
            .is_ok();

        if installed {
            tracing::info!("Question answering ready ({} chunks indexed)", chunks);
        } else {
            tracing::warn!("Ignoring second context installation");
        }
        installed
    }

    /// Build the index in a background task and install it when done.
    ///
    /// A failed build is logged and leaves the surface unready.
    pub fn spawn_index_build(
        &self,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> tokio::task::JoinHandle<()> {
        let state = self.clone();

        tokio::spawn(async move {
            tracing::info!("Building retrieval index in the background...");
            match RagContext::build(state.config().clone(), embedder, llm).await {
                Ok(context) => {
                    state.set_context(Arc::new(context));
                }
                Err(e) => {
                    tracing::error!("Index build failed, staying unready: {}", e);
                }
            }
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Orchestrator, or `NotReady` while the index is building
    pub fn orchestrator(&self) -> Result<&AnswerOrchestrator> {
        self.inner
            .orchestrator
            .get()
            .ok_or_else(|| Error::NotReady("retrieval index is still being built".to_string()))
    }

    /// Check if the index has been built
    pub fn is_ready(&self) -> bool {
        self.inner.orchestrator.initialized()
    }
}

/// Shared state for the ingest/query gateway
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<GatewayStateInner>,
}

struct GatewayStateInner {
    /// Backing vector store
    store: Arc<dyn VectorStoreProvider>,
    /// Embeds text when a request carries no vector
    embedder: Arc<dyn EmbeddingProvider>,
    /// Results per query
    query_limit: usize,
    /// Deadline for embedding calls
    embed_timeout: std::time::Duration,
}

impl GatewayState {
    /// Create gateway state
    pub fn new(
        config: &RagConfig,
        store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayStateInner {
                store,
                embedder,
                query_limit: config.gateway.query_limit,
                embed_timeout: config.embeddings.timeout(),
            }),
        }
    }

    /// Get vector store
    pub fn store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.store
    }

    /// Get embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Results per query
    pub fn query_limit(&self) -> usize {
        self.inner.query_limit
    }

    /// Deadline for embedding calls
    pub fn embed_timeout(&self) -> std::time::Duration {
        self.inner.embed_timeout
    }
}
