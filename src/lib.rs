// SPDX-License-Identifier: MIT

//! # MikroTik Dashboard Backend
//!
//! Backend service for a MikroTik RouterOS dashboard. Persists device
//! records, probes device status over the RouterOS API, and streams live
//! log/alert events to connected browser clients.
//!
//! ## Main modules
//! - `api`: HTTP API handlers (CRUD, connect action, SSE event stream)
//! - `config`: configuration management
//! - `connect`: the connect workflow tying registry, pool, probe and events together
//! - `error`: error types
//! - `events`: in-process publish/subscribe event bus
//! - `registry`: persisted device records
//! - `routeros`: RouterOS sessions, connection pool, status probe
//! - `prelude`: commonly used types and traits

mod api;
mod config;
mod connect;
mod error;
mod events;
mod registry;
mod routeros;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::Config;

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Connect workflow
pub use connect::{ConnectError, ConnectOutcome, connect_device};

/// Event bus
pub use events::{Event, EventBus, EventKind, EventLevel, Subscription};

/// Device registry and records
pub use registry::{Device, DeviceFields, DeviceRegistry, DeviceStatus};

/// RouterOS session pool and probe
pub use routeros::{
    ConnectParams, ConnectionPool, PooledSession, ProbeError, ProbeReport, SessionError, probe,
};

/// RouterOS wire protocol length encoding (public for tests)
pub use routeros::encode_length;
