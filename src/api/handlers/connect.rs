//! The connect action endpoint

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::api::AppState;
use crate::connect::{ConnectError, connect_device};

/// POST /api/devices/{id}/connect
///
/// Synchronous response carries only the outcome; diagnostics flow through
/// the event stream.
pub async fn connect_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match connect_device(&state.registry, &state.pool, &state.events, &id).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(ConnectError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "device not found" })),
        )
            .into_response(),
        Err(ConnectError::Registry(err)) => {
            tracing::error!("Registry failure during connect to {}: {}", id, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "DB error" })),
            )
                .into_response()
        }
        Err(err) => {
            tracing::debug!("Connect to {} failed: {}", id, err);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "connection failed" })),
            )
                .into_response()
        }
    }
}
