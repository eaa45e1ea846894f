//! Health and readiness endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::server::state::{GatewayState, QaState};
use crate::types::{GatewayHealth, HealthResponse};

/// GET /health - Index status of the question-answering surface
pub async fn qa_health(State(state): State<QaState>) -> (StatusCode, Json<HealthResponse>) {
    if state.is_ready() {
        (StatusCode::OK, Json(HealthResponse::ready()))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::initializing()),
        )
    }
}

/// GET /ready - Readiness check
pub async fn readiness(State(state): State<QaState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health - Vector store reachability for the gateway
pub async fn gateway_health(State(state): State<GatewayState>) -> (StatusCode, Json<GatewayHealth>) {
    match state.store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(GatewayHealth {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Vector store health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(GatewayHealth {
                    status: "unhealthy".to_string(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
