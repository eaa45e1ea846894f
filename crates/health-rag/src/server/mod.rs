//! HTTP servers: question answering and the ingest/query gateway

pub mod routes;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::VectorStoreProvider;
pub use state::{GatewayState, QaState};

/// Question-answering HTTP server
pub struct QaServer {
    config: RagConfig,
    state: QaState,
}

impl QaServer {
    /// Create a server around existing state
    pub fn new(config: RagConfig, state: QaState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        with_layers(
            routes::qa_routes().with_state(self.state.clone()),
            self.config.server.enable_cors,
        )
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let router = self.build_router();
        serve(router, &self.config.server.host, self.config.server.port, "question answering").await
    }
}

/// Ingest/query gateway HTTP server
pub struct GatewayServer {
    config: RagConfig,
    state: GatewayState,
}

impl GatewayServer {
    /// Create a gateway around existing state
    pub fn new(config: RagConfig, state: GatewayState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        with_layers(
            routes::gateway_routes().with_state(self.state.clone()),
            self.config.server.enable_cors,
        )
    }

    /// Ensure the store schema, then start serving
    pub async fn start(self) -> Result<()> {
        wait_for_schema(
            self.state.store(),
            self.config.vector_db.startup_retries,
            self.config.vector_db.retry_delay(),
        )
        .await?;

        let router = self.build_router();
        serve(router, &self.config.gateway.host, self.config.gateway.port, "gateway").await
    }
}

/// Create the store schema, retrying with a fixed delay while the store comes up.
///
/// Exhausting the attempts is fatal for the gateway.
pub async fn wait_for_schema(
    store: &Arc<dyn VectorStoreProvider>,
    retries: u32,
    delay: Duration,
) -> Result<()> {
    let attempts = retries.max(1);

    for attempt in 1..=attempts {
        match store.ensure_schema().await {
            Ok(()) => {
                tracing::info!("Vector store '{}' schema ready", store.name());
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(
                    "Vector store not ready (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    attempts,
                    delay,
                    e
                );
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(Error::vector_db(format!(
        "schema could not be ensured after {} attempts",
        attempts
    )))
}

fn with_layers(router: Router, enable_cors: bool) -> Router {
    let router = router.layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

async fn serve(router: Router, host: &str, port: u16, what: &str) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

    tracing::info!("Starting {} server on http://{}", what, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{InMemoryVectorStore, StoredObject};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct FlakyStore {
        failures_left: AtomicU32,
    }

    #[async_trait]
    impl VectorStoreProvider for FlakyStore {
        async fn ensure_schema(&self) -> Result<()> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::vector_db("connection refused"));
            }
            Ok(())
        }

        async fn upsert(&self, _id: Uuid, _vector: &[f32], _payload: &StoredObject) -> Result<()> {
            Ok(())
        }

        async fn nearest(&self, _vector: &[f32], _limit: usize) -> Result<Vec<StoredObject>> {
            Ok(vec![])
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_retry_recovers() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(FlakyStore {
            failures_left: AtomicU32::new(3),
        });
        assert!(wait_for_schema(&store, 10, Duration::from_secs(2)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_retry_exhausts() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(FlakyStore {
            failures_left: AtomicU32::new(5),
        });
        let err = wait_for_schema(&store, 3, Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
    }

    #[tokio::test]
    async fn test_memory_store_is_ready_at_once() {
        let store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryVectorStore::new());
        assert!(wait_for_schema(&store, 1, Duration::from_secs(2)).await.is_ok());
    }
}
