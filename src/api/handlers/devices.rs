//! Device registry CRUD endpoints

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::api::AppState;
use crate::registry::DeviceFields;

fn db_error(err: sqlx::Error) -> Response {
    tracing::error!("Registry query failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "DB error" })),
    )
        .into_response()
}

fn bad_request(msg: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

/// GET /api/devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Response {
    match state.registry.list_devices().await {
        Ok(devices) => Json(devices).into_response(),
        Err(err) => db_error(err),
    }
}

/// POST /api/devices
pub async fn create_device(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<DeviceFields>,
) -> Response {
    if let Err(msg) = fields.validate() {
        return bad_request(msg);
    }
    match state.registry.insert_device(fields).await {
        Ok(device) => {
            tracing::info!("Created device '{}' ({})", device.name, device.id);
            (StatusCode::CREATED, Json(device)).into_response()
        }
        Err(err) => db_error(err),
    }
}

/// PUT /api/devices/{id}
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(fields): Json<DeviceFields>,
) -> Response {
    if let Err(msg) = fields.validate() {
        return bad_request(msg);
    }
    match state.registry.update_device(&id, fields).await {
        Ok(Some(device)) => Json(device).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "device not found" })),
        )
            .into_response(),
        Err(err) => db_error(err),
    }
}

/// DELETE /api/devices/{id}
///
/// Also evicts any pooled session for the device.
pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.registry.delete_device(&id).await {
        Ok(removed) => {
            state.pool.release(&id).await;
            if removed {
                tracing::info!("Deleted device {}", id);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => db_error(err),
    }
}
