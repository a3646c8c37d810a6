//! HTTP API module for the dashboard backend
//!
//! # Endpoints
//! - `GET    /health`: health check
//! - `GET    /api/devices`: list device records
//! - `POST   /api/devices`: create a device
//! - `PUT    /api/devices/{id}`: update a device
//! - `DELETE /api/devices/{id}`: delete a device (evicts its pooled session)
//! - `POST   /api/devices/{id}/connect`: run the connect workflow
//! - `GET    /api/events`: live event stream (SSE)

pub mod handlers;

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::config::Config;
use crate::events::EventBus;
use crate::registry::DeviceRegistry;
use crate::routeros::ConnectionPool;

/// Application state shared with endpoints
pub struct AppState {
    pub config: Config,
    pub registry: DeviceRegistry,
    pub pool: Arc<ConnectionPool>,
    pub events: EventBus,
}

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/devices",
            get(handlers::list_devices).post(handlers::create_device),
        )
        .route(
            "/api/devices/{id}",
            put(handlers::update_device).delete(handlers::delete_device),
        )
        .route("/api/devices/{id}/connect", post(handlers::connect_handler))
        .route("/api/events", get(handlers::event_stream))
        .with_state(state)
}
