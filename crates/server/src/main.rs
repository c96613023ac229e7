//! Screw classification server
//!
//! Serves torque-only and multi-feature workpiece result predictions over
//! HTTP, alongside health and Prometheus endpoints.

use anyhow::{Context, Result};
use screw_lib::{
    health::HealthRegistry,
    inference::ModelRegistry,
    observability::{ClassifierMetrics, StructuredLogger},
    pipeline::InferenceService,
};
use screw_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting screw-server");

    let config = ServerConfig::load()?;
    info!(
        torque_model = %config.torque_model_path,
        multi_model = %config.multi_model_path,
        labels = ?config.labels,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_models().await;

    // Register collectors so /metrics lists them before the first request
    ClassifierMetrics::new();
    let logger = StructuredLogger::new(&config.instance);

    let models = Arc::new(ModelRegistry::new(config.to_loader()));
    let service = Arc::new(InferenceService::new(models.clone(), logger.clone()));

    if config.preload_models {
        let warm = models.clone();
        let results = tokio::task::spawn_blocking(move || warm.preload())
            .await
            .context("Model preload task failed")?;
        for (target, result) in results {
            if let Err(e) = result {
                warn!(model_target = %target, error = %e, "Continuing without model");
            }
        }
    }
    health_registry.sync_models(&models).await;

    logger.log_startup(SERVER_VERSION, config.preload_models);

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), service));

    health_registry.set_ready(true).await;

    let shutdown_logger = logger.clone();
    api::serve(config.api_port, app_state, async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown_logger.log_shutdown("SIGINT received"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await
            }
        }
    })
    .await?;

    info!("Shutting down");
    Ok(())
}
