//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use screw_lib::{
    error::{InferenceError, PredictError},
    health::{ComponentStatus, HealthRegistry},
    pipeline::{InferenceService, Prediction},
    requests::{mode_catalog, CustomRequest, ErrorResponse, PredictionResponse, TorqueRequest},
};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub service: Arc<InferenceService>,
}

impl AppState {
    pub fn new(health_registry: HealthRegistry, service: Arc<InferenceService>) -> Self {
        Self {
            health_registry,
            service,
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .health_registry
        .sync_models(state.service.models())
        .await;
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .health_registry
        .sync_models(state.service.models())
        .await;
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn modes() -> impl IntoResponse {
    Json(mode_catalog())
}

async fn predict_torque(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TorqueRequest>,
) -> Response {
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.predict_torque(&request)).await;
    prediction_response(outcome)
}

async fn predict_custom(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CustomRequest>,
) -> Response {
    let service = state.service.clone();
    let outcome = tokio::task::spawn_blocking(move || service.predict_custom(&request)).await;
    prediction_response(outcome)
}

/// Map a finished submission onto a status code and body
fn prediction_response(
    outcome: Result<Result<Prediction, PredictError>, tokio::task::JoinError>,
) -> Response {
    match outcome {
        Ok(Ok(prediction)) => {
            (StatusCode::OK, Json(PredictionResponse::from(prediction))).into_response()
        }
        Ok(Err(PredictError::Validation(e))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::validation(&e)),
        )
            .into_response(),
        Ok(Err(PredictError::Inference(e))) => {
            let status = match e {
                InferenceError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ErrorResponse::inference(&e))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Prediction task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal()),
            )
                .into_response()
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/modes", get(modes))
        .route("/api/v1/predict/torque", post(predict_torque))
        .route("/api/v1/predict/custom", post(predict_custom))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
