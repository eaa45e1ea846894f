//! Vector ingest endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::StoredObject;
use crate::server::state::GatewayState;
use crate::types::{IngestRequest, IngestResponse};

use super::resolve_vector;

/// POST /ingest - Store text with a supplied or computed vector
pub async fn ingest(
    State(state): State<GatewayState>,
    payload: std::result::Result<Json<IngestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::JsonDataError(e)) => return Err(Error::invalid_input(e.body_text())),
        Err(_) => return Err(Error::invalid_input("JSON body required")),
    };

    if request.text.is_none() && request.embedding.is_none() && request.meta.is_none() {
        return Err(Error::invalid_input("JSON body required"));
    }

    let vector = resolve_vector(
        &state,
        request.text.as_deref(),
        request.embedding,
        "text required if no embedding provided",
    )
    .await?;

    let meta = request.meta.unwrap_or_else(|| Value::Object(Default::default()));
    let object = StoredObject {
        text: request.text.unwrap_or_default(),
        meta: serde_json::to_string(&meta)?,
    };

    let id = Uuid::new_v4();
    state.store().upsert(id, &vector, &object).await.map_err(|e| {
        tracing::error!("Ingest into '{}' failed: {}", state.store().name(), e);
        e
    })?;

    tracing::debug!("Ingested object {} ({} dims)", id, vector.len());
    Ok((StatusCode::CREATED, Json(IngestResponse::ok())))
}
