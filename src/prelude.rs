// SPDX-License-Identifier: MIT

//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need:
//!
//! ```rust
//! use mikrotik_dashd::prelude::*;
//! ```

// Core types
pub use crate::config::Config;
pub use crate::error::{AppError, Result};

// Registry
pub use crate::registry::{Device, DeviceFields, DeviceRegistry, DeviceStatus};

// Connect workflow and events
pub use crate::connect::{ConnectError, ConnectOutcome, connect_device};
pub use crate::events::{Event, EventBus, EventKind, EventLevel, Subscription};

// RouterOS plumbing
pub use crate::routeros::{ConnectParams, ConnectionPool, ProbeError, ProbeReport, SessionError};
