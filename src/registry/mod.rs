//! Device registry backed by sqlite
//!
//! The registry is the only persisted state: one row per device. The
//! connect workflow reads records and writes back observed status; the
//! CRUD handlers expose the rest.

mod model;

pub use model::{Device, DeviceFields, DeviceStatus};

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::Result;

/// Persistent store of device records
#[derive(Clone)]
pub struct DeviceRegistry {
    pool: SqlitePool,
}

impl DeviceRegistry {
    /// Opens (creating if necessary) the database and runs migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Ensure the parent directory exists before sqlx tries to open the file
        let filename = connect_opts.clone().get_filename().to_owned();
        let in_memory = filename.to_str() == Some(":memory:");
        if !in_memory {
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        // Every connection to :memory: is a distinct database, so the pool
        // must stay on a single connection there.
        let max_connections = if in_memory { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_opts)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Device registry initialized at {}", database_url);
        Ok(Self { pool })
    }

    /// Lists all devices, ordered by display name
    pub async fn list_devices(&self) -> std::result::Result<Vec<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices ORDER BY name")
            .fetch_all(&self.pool)
            .await
    }

    /// Fetches a single device by id
    pub async fn get_device(&self, id: &str) -> std::result::Result<Option<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts a new device and returns the stored record
    pub async fn insert_device(
        &self,
        fields: DeviceFields,
    ) -> std::result::Result<Device, sqlx::Error> {
        let device = Device::new(fields);
        sqlx::query(
            "INSERT INTO devices \
             (id, name, ip, port, username, password, use_https, status, last_seen, version, board, uptime) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&device.id)
        .bind(&device.name)
        .bind(&device.ip)
        .bind(device.port)
        .bind(&device.username)
        .bind(&device.password)
        .bind(device.use_https)
        .bind(device.status)
        .bind(&device.last_seen)
        .bind(&device.version)
        .bind(&device.board)
        .bind(&device.uptime)
        .execute(&self.pool)
        .await?;
        Ok(device)
    }

    /// Replaces the user-editable fields of a device; returns the updated
    /// record, or `None` if the id is unknown
    pub async fn update_device(
        &self,
        id: &str,
        fields: DeviceFields,
    ) -> std::result::Result<Option<Device>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE devices SET name = ?, ip = ?, port = ?, username = ?, password = ?, use_https = ? \
             WHERE id = ?",
        )
        .bind(&fields.name)
        .bind(&fields.ip)
        .bind(fields.port)
        .bind(&fields.username)
        .bind(&fields.password)
        .bind(fields.use_https)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_device(id).await
    }

    /// Deletes a device row; returns whether anything was removed
    pub async fn delete_device(&self, id: &str) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Records a successful probe: status goes online and the observed
    /// metadata is refreshed
    pub async fn record_probe_success(
        &self,
        id: &str,
        last_seen: &str,
        version: &str,
        board: &str,
        uptime: &str,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE devices SET status = ?, last_seen = ?, version = ?, board = ?, uptime = ? \
             WHERE id = ?",
        )
        .bind(DeviceStatus::Online)
        .bind(last_seen)
        .bind(version)
        .bind(board)
        .bind(uptime)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Marks a device offline, leaving all other fields untouched
    pub async fn mark_offline(&self, id: &str) -> std::result::Result<(), sqlx::Error> {
        sqlx::query("UPDATE devices SET status = ? WHERE id = ?")
            .bind(DeviceStatus::Offline)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
