//! pylon Control Plane
//!
//! Central coordination service for the container platform: it exposes the
//! REST API, schedules placements across the host fleet, and dispatches
//! lifecycle commands to workers over the message broker.

use std::sync::Arc;

use anyhow::Result;
use pylon_control_plane::{
    api,
    bridge::mqtt::MqttConnector,
    config,
    orchestrator::OrchestratorOptions,
    state::AppState,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to PYLON_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting pylon control plane");
    info!(
        listen_addr = %config.listen_addr,
        mqtt_host = %config.mqtt_host,
        mqtt_port = config.mqtt_port,
        call_timeout_secs = config.call_timeout.as_secs(),
        "Configuration loaded"
    );

    let connector = Arc::new(MqttConnector::new(
        config.mqtt_host.clone(),
        config.mqtt_port,
    ));
    let options = OrchestratorOptions {
        call_timeout: config.call_timeout,
        serialize_container_ops: config.serialize_container_ops,
    };
    let state = AppState::in_memory(connector, options);

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Control plane shutdown complete");
    Ok(())
}
