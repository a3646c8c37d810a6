//! Connect workflow: lookup, announce, acquire, probe, record, notify
//!
//! Every exit path is an explicit branch. A failed attempt is a handled
//! outcome: the device is marked offline, error events go out, and the
//! caller gets a well-formed error. Nothing escapes past this module.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::events::{Event, EventBus, EventLevel};
use crate::registry::{Device, DeviceRegistry, DeviceStatus};
use crate::routeros::{ConnectParams, ConnectionPool, ProbeError, ProbeReport, SessionError, probe};

/// Why a connect request failed
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Unknown device id; no events are emitted for this case
    #[error("device not found")]
    NotFound,

    /// Could not establish or re-establish a session
    #[error("connection failed: {0}")]
    Connection(#[source] SessionError),

    /// Session established but the status query failed
    #[error("probe failed: {0}")]
    Probe(#[source] ProbeError),

    /// Registry read/write failure
    #[error("registry failure: {0}")]
    Registry(#[from] sqlx::Error),
}

/// Success payload of a connect request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutcome {
    pub status: DeviceStatus,
    pub version: String,
    pub board: String,
    pub last_seen: String,
}

/// Runs one connect attempt against the device with the given id
pub async fn connect_device(
    registry: &DeviceRegistry,
    pool: &ConnectionPool,
    bus: &EventBus,
    device_id: &str,
) -> Result<ConnectOutcome, ConnectError> {
    // Lookup
    let device = registry
        .get_device(device_id)
        .await?
        .ok_or(ConnectError::NotFound)?;

    // Announce
    bus.publish(
        Event::log(
            EventLevel::Info,
            format!("Connecting to {}", device.display_target()),
        )
        .with_device(&device.id, &device.name),
    );

    // Acquire + Probe
    match attempt(pool, &device).await {
        Ok(report) => {
            let last_seen = Utc::now().to_rfc3339();
            registry
                .record_probe_success(
                    &device.id,
                    &last_seen,
                    &report.version,
                    &report.board_name,
                    &report.uptime,
                )
                .await?;

            bus.publish(
                Event::alert(EventLevel::Info, "Connection successful")
                    .with_device(&device.id, &device.name),
            );
            bus.publish(
                Event::log(EventLevel::Info, format!("Connected to {}", device.name))
                    .with_device(&device.id, &device.name),
            );

            tracing::info!(
                "Device {} online: version {}, board {}",
                device.display_target(),
                report.version,
                report.board_name
            );
            Ok(ConnectOutcome {
                status: DeviceStatus::Online,
                version: report.version,
                board: report.board_name,
                last_seen,
            })
        }
        Err(err) => {
            registry.mark_offline(&device.id).await?;

            bus.publish(
                Event::alert(
                    EventLevel::Error,
                    format!("Connection to {} failed", device.display_target()),
                )
                .with_device(&device.id, &device.name),
            );
            bus.publish(
                Event::log(
                    EventLevel::Error,
                    format!("Failed to connect to {}: {}", device.display_target(), err),
                )
                .with_device(&device.id, &device.name),
            );

            tracing::warn!("Connect to device {} failed: {}", device.id, err);
            Err(err)
        }
    }
}

/// Acquires a pooled session and probes it
///
/// A probe failure taints the session, so the pool entry is released
/// before the error goes back up.
async fn attempt(pool: &ConnectionPool, device: &Device) -> Result<ProbeReport, ConnectError> {
    let params = connect_params(device);
    let mut session = pool
        .acquire(&device.id, &params)
        .await
        .map_err(ConnectError::Connection)?;

    match probe(&mut session).await {
        Ok(report) => Ok(report),
        Err(err) => {
            drop(session);
            pool.release(&device.id).await;
            Err(ConnectError::Probe(err))
        }
    }
}

fn connect_params(device: &Device) -> ConnectParams {
    ConnectParams {
        addr: format!("{}:{}", device.ip, device.port),
        username: device.username.clone(),
        password: device.password.clone(),
        secure: device.use_https,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DeviceFields;

    fn device() -> Device {
        Device::new(DeviceFields {
            name: "gateway".to_string(),
            ip: "10.0.0.1".to_string(),
            port: 8728,
            username: "admin".to_string(),
            password: "secret".to_string(),
            use_https: false,
        })
    }

    #[test]
    fn test_connect_params_from_device() {
        let params = connect_params(&device());
        assert_eq!(params.addr, "10.0.0.1:8728");
        assert_eq!(params.username, "admin");
        assert!(!params.secure);
    }

    #[test]
    fn test_outcome_serializes_to_wire_shape() {
        let outcome = ConnectOutcome {
            status: DeviceStatus::Online,
            version: "7.10.1".to_string(),
            board: "RB4011".to_string(),
            last_seen: "2026-08-23T12:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "online");
        assert_eq!(json["version"], "7.10.1");
        assert_eq!(json["board"], "RB4011");
        assert_eq!(json["lastSeen"], "2026-08-23T12:00:00Z");
    }
}
