//! Routes for the question-answering surface and the ingest/query gateway

pub mod ask;
pub mod health;
pub mod ingest;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::error::{Error, Result};
use crate::providers::{prepare_text, with_timeout};
use crate::server::state::{GatewayState, QaState};

/// Question-answering routes
pub fn qa_routes() -> Router<QaState> {
    Router::new()
        .route("/ask", post(ask::ask))
        .route("/health", get(health::qa_health))
        .route("/ready", get(health::readiness))
}

/// Ingest/query gateway routes
pub fn gateway_routes() -> Router<GatewayState> {
    Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/query", post(query::query))
        .route("/health", get(health::gateway_health))
}

/// Use a supplied vector, else embed `text`; `missing` is the error when neither is usable
async fn resolve_vector(
    state: &GatewayState,
    text: Option<&str>,
    embedding: Option<Vec<f32>>,
    missing: &str,
) -> Result<Vec<f32>> {
    if let Some(embedding) = embedding {
        if embedding.is_empty() {
            return Err(Error::invalid_input("embedding must not be empty"));
        }
        return Ok(embedding);
    }

    let text = text
        .and_then(|t| prepare_text(t).ok())
        .ok_or_else(|| Error::invalid_input(missing))?;

    with_timeout(
        state.embed_timeout(),
        "Gateway embedding",
        state.embedder().embed(text),
    )
    .await
}
