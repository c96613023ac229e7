//! One submission end to end: parse, assemble, validate, route

use super::assembly::{assemble, FeatureSelection, RawInputs};
use super::router::ModelRouter;
use crate::error::PredictError;
use crate::inference::ModelRegistry;
use crate::models::{FeatureName, Label, PredictionMode};
use crate::observability::{ClassifierMetrics, StructuredLogger};
use crate::requests::{CustomRequest, TorqueRequest};
use std::sync::Arc;
use std::time::Instant;

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mode: PredictionMode,
    pub label: Label,
    pub features: Vec<FeatureName>,
    pub elapsed_us: u64,
}

/// Runs submissions synchronously against the shared classifiers
#[derive(Clone)]
pub struct InferenceService {
    router: ModelRouter,
    metrics: ClassifierMetrics,
    logger: StructuredLogger,
}

impl InferenceService {
    pub fn new(models: Arc<ModelRegistry>, logger: StructuredLogger) -> Self {
        Self {
            router: ModelRouter::new(models),
            metrics: ClassifierMetrics::new(),
            logger,
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        self.router.models()
    }

    pub fn predict(
        &self,
        mode: PredictionMode,
        selection: &FeatureSelection,
        inputs: &RawInputs,
    ) -> Result<Prediction, PredictError> {
        let start = Instant::now();

        let record = assemble(selection, inputs).map_err(|e| {
            self.metrics.inc_validation_failures(&e.invalid_features());
            self.logger.log_validation_failure(mode, &e);
            e
        })?;

        let label = self.router.route(mode, &record).map_err(|e| {
            self.metrics.inc_inference_errors(e.target());
            self.logger.log_inference_failure(mode, &e);
            e
        })?;

        let elapsed = start.elapsed();
        let prediction = Prediction {
            mode,
            label,
            features: record.names(),
            elapsed_us: elapsed.as_micros() as u64,
        };

        self.metrics
            .observe_prediction_latency(mode, elapsed.as_secs_f64());
        self.metrics.inc_predictions(mode, &prediction.label);
        self.logger.log_prediction(
            mode,
            &prediction.label,
            &prediction.features,
            prediction.elapsed_us,
        );

        Ok(prediction)
    }

    pub fn predict_torque(&self, request: &TorqueRequest) -> Result<Prediction, PredictError> {
        self.predict(
            PredictionMode::TorqueOnly,
            &FeatureSelection::torque_only(),
            &request.raw_inputs(),
        )
    }

    pub fn predict_custom(&self, request: &CustomRequest) -> Result<Prediction, PredictError> {
        self.predict(
            PredictionMode::Custom,
            &request.selection(),
            &request.raw_inputs(),
        )
    }
}
