//! Device record types for the registry

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted status of a device, as last observed by a connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
}

/// A managed RouterOS device as stored in the registry
///
/// `id` is assigned at creation and never changes. The status block
/// (`status`, `last_seen`, `version`, `board`, `uptime`) is maintained by
/// the connect workflow; everything else comes from user edits.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub port: i64,
    pub username: String,
    pub password: String,
    pub use_https: bool,
    pub status: DeviceStatus,
    pub last_seen: Option<String>,
    pub version: Option<String>,
    pub board: Option<String>,
    pub uptime: Option<String>,
}

impl Device {
    /// Builds a fresh record from user-supplied fields; status starts offline
    pub fn new(fields: DeviceFields) -> Self {
        Device {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            ip: fields.ip,
            port: fields.port,
            username: fields.username,
            password: fields.password,
            use_https: fields.use_https,
            status: DeviceStatus::Offline,
            last_seen: None,
            version: None,
            board: None,
            uptime: None,
        }
    }

    /// Human-facing target for log messages: display name, or address if unnamed
    pub fn display_target(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.ip
        } else {
            &self.name
        }
    }
}

/// User-editable fields of a device record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFields {
    pub name: String,
    pub ip: String,
    #[serde(default = "default_api_port")]
    pub port: i64,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub use_https: bool,
}

impl DeviceFields {
    /// Validates user input before it reaches the registry
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Device name cannot be empty".to_string());
        }
        if self.ip.trim().is_empty() {
            return Err("Device address cannot be empty".to_string());
        }
        if self.username.trim().is_empty() {
            return Err(format!(
                "Username cannot be empty for device '{}'",
                self.name
            ));
        }
        if self.password.is_empty() {
            return Err(format!(
                "Password cannot be empty for device '{}'",
                self.name
            ));
        }
        if !(1..=65535).contains(&self.port) {
            return Err(format!("Invalid API port {}", self.port));
        }
        Ok(())
    }
}

fn default_api_port() -> i64 {
    8728
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> DeviceFields {
        DeviceFields {
            name: name.to_string(),
            ip: "192.168.88.1".to_string(),
            port: 8728,
            username: "admin".to_string(),
            password: "secret".to_string(),
            use_https: false,
        }
    }

    #[test]
    fn test_new_device_starts_offline() {
        let device = Device::new(fields("gateway"));
        assert_eq!(device.status, DeviceStatus::Offline);
        assert!(device.last_seen.is_none());
        assert!(device.version.is_none());
        assert!(device.board.is_none());
        assert!(!device.id.is_empty());
    }

    #[test]
    fn test_new_devices_get_distinct_ids() {
        let a = Device::new(fields("a"));
        let b = Device::new(fields("b"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_display_target_prefers_name() {
        let device = Device::new(fields("gateway"));
        assert_eq!(device.display_target(), "gateway");

        let mut unnamed = Device::new(fields("x"));
        unnamed.name = "  ".to_string();
        assert_eq!(unnamed.display_target(), "192.168.88.1");
    }

    #[test]
    fn test_fields_default_port() {
        let json = r#"{
            "name": "gateway",
            "ip": "10.0.0.1",
            "username": "admin",
            "password": "secret"
        }"#;

        let fields: DeviceFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.port, 8728);
        assert!(!fields.use_https);
    }

    #[test]
    fn test_fields_validate() {
        assert!(fields("gateway").validate().is_ok());

        let mut bad = fields("");
        assert!(bad.validate().is_err());

        bad = fields("gateway");
        bad.username = String::new();
        assert!(bad.validate().is_err());

        bad = fields("gateway");
        bad.port = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_device_status_serde() {
        assert_eq!(
            serde_json::to_string(&DeviceStatus::Online).unwrap(),
            "\"online\""
        );
        let status: DeviceStatus = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(status, DeviceStatus::Warning);
    }

    #[test]
    fn test_device_json_is_camel_case() {
        let device = Device::new(fields("gateway"));
        let json = serde_json::to_value(&device).unwrap();
        assert!(json.get("useHttps").is_some());
        assert!(json.get("lastSeen").is_some());
        assert_eq!(json["status"], "offline");
    }
}
