mod api;
mod config;
mod connect;
mod error;
mod events;
mod registry;
mod routeros;

use std::net::SocketAddr;
use std::sync::Arc;

use error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use events::EventBus;
use registry::DeviceRegistry;
use routeros::ConnectionPool;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();

    let registry = DeviceRegistry::connect(&config.database_url).await?;

    let state = Arc::new(api::AppState {
        config: config.clone(),
        registry,
        pool: Arc::new(ConnectionPool::new()),
        events: EventBus::new(),
    });

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let app = api::create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("MikroTik dashboard backend starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET    /health                    - Health check");
    tracing::info!("  - GET    /api/devices               - List devices");
    tracing::info!("  - POST   /api/devices               - Create device");
    tracing::info!("  - PUT    /api/devices/{{id}}          - Update device");
    tracing::info!("  - DELETE /api/devices/{{id}}          - Delete device");
    tracing::info!("  - POST   /api/devices/{{id}}/connect  - Connect to device");
    tracing::info!("  - GET    /api/events                - Live event stream");

    let mut shutdown_rx = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    Ok(())
}

fn setup_tracing() {
    // Honor RUST_LOG when set, default to "info" otherwise
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
