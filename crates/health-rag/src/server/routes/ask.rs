//! Question-answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::QaState;
use crate::types::{AskRequest, AskResponse};

/// POST /ask - Answer a question from the indexed health records
pub async fn ask(
    State(state): State<QaState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let Json(request) = payload.map_err(|e| Error::invalid_input(e.body_text()))?;

    let response = state.orchestrator()?.answer(&request).await.map_err(|e| {
        tracing::error!("Question failed: {}", e);
        e
    })?;

    Ok(Json(response))
}
