//! Nearest-neighbor query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::GatewayState;
use crate::types::{VectorMatch, VectorQueryRequest, VectorQueryResponse};

use super::resolve_vector;

/// POST /query - Nearest stored objects to a supplied or computed vector
pub async fn query(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<VectorQueryRequest>, JsonRejection>,
) -> Result<Json<VectorQueryResponse>> {
    // A missing or unreadable body is treated as an empty query
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::JsonDataError(e)) => return Err(Error::invalid_input(e.body_text())),
        Err(_) => VectorQueryRequest::default(),
    };

    let vector = resolve_vector(
        &state,
        request.text.as_deref(),
        request.embedding,
        "text or embedding required",
    )
    .await?;

    let results = state
        .store()
        .nearest(&vector, state.query_limit())
        .await?
        .into_iter()
        .map(VectorMatch::from)
        .collect();

    Ok(Json(VectorQueryResponse { results }))
}
