//! Observability infrastructure for the classification service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, model load latency, outcome counters)
//! - Structured JSON logging with tracing

use crate::error::{InferenceError, ValidationError};
use crate::models::{FeatureName, Label, ModelTarget, PredictionMode};
use prometheus::{
    register_gauge_vec, register_histogram, register_histogram_vec, register_int_counter_vec,
    GaugeVec, Histogram, HistogramVec, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Model loads read and compile whole graphs, so they get wider buckets
const LOAD_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: HistogramVec,
    model_load_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    validation_failures_total: IntCounterVec,
    inference_errors_total: IntCounterVec,
    model_loaded: GaugeVec,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "screw_classifier_prediction_latency_seconds",
                "Time spent on one submission from parsing to label",
                &["mode"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            model_load_latency_seconds: register_histogram!(
                "screw_classifier_model_load_latency_seconds",
                "Time spent loading a classifier artifact",
                LOAD_BUCKETS.to_vec()
            )
            .expect("Failed to register model_load_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "screw_classifier_predictions_total",
                "Predictions returned, by mode and label",
                &["mode", "label"]
            )
            .expect("Failed to register predictions_total"),

            validation_failures_total: register_int_counter_vec!(
                "screw_classifier_validation_failures_total",
                "Submissions rejected because a series was invalid, by feature",
                &["feature"]
            )
            .expect("Failed to register validation_failures_total"),

            inference_errors_total: register_int_counter_vec!(
                "screw_classifier_inference_errors_total",
                "Submissions that failed inside a classifier, by model",
                &["model"]
            )
            .expect("Failed to register inference_errors_total"),

            model_loaded: register_gauge_vec!(
                "screw_classifier_model_loaded",
                "1 if the classifier loaded, 0 if its load failed",
                &["model"]
            )
            .expect("Failed to register model_loaded"),
        }
    }
}

/// Handle to the global metrics. Clones share the same collectors.
#[derive(Clone)]
pub struct ClassifierMetrics {
    _private: (),
}

impl Default for ClassifierMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, mode: PredictionMode, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[mode.as_str()])
            .observe(duration_secs);
    }

    pub fn observe_model_load_latency(&self, duration_secs: f64) {
        self.inner().model_load_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, mode: PredictionMode, label: &Label) {
        self.inner()
            .predictions_total
            .with_label_values(&[mode.as_str(), label.as_str()])
            .inc();
    }

    pub fn inc_validation_failures(&self, features: &[FeatureName]) {
        for feature in features {
            self.inner()
                .validation_failures_total
                .with_label_values(&[feature.as_str()])
                .inc();
        }
    }

    pub fn inc_inference_errors(&self, target: ModelTarget) {
        self.inner()
            .inference_errors_total
            .with_label_values(&[target.as_str()])
            .inc();
    }

    pub fn set_model_loaded(&self, target: ModelTarget, loaded: bool) {
        self.inner()
            .model_loaded
            .with_label_values(&[target.as_str()])
            .set(if loaded { 1.0 } else { 0.0 });
    }
}

/// Structured logger for submission outcomes and service lifecycle
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_prediction(
        &self,
        mode: PredictionMode,
        label: &Label,
        features: &[FeatureName],
        elapsed_us: u64,
    ) {
        let features = features
            .iter()
            .map(FeatureName::as_str)
            .collect::<Vec<_>>()
            .join(",");
        info!(
            event = "prediction_completed",
            instance = %self.instance,
            mode = %mode,
            label = %label,
            features = %features,
            elapsed_us = elapsed_us,
            "Predicted workpiece result"
        );
    }

    pub fn log_validation_failure(&self, mode: PredictionMode, error: &ValidationError) {
        let details = error
            .failures()
            .iter()
            .map(|(name, reason)| format!("{}: {}", name, reason))
            .collect::<Vec<_>>()
            .join("; ");
        info!(
            event = "validation_failed",
            instance = %self.instance,
            mode = %mode,
            details = %details,
            "Submission rejected by validation"
        );
    }

    pub fn log_inference_failure(&self, mode: PredictionMode, error: &InferenceError) {
        warn!(
            event = "inference_failed",
            instance = %self.instance,
            mode = %mode,
            model = %error.target(),
            error = %error,
            "Classifier failed on a valid record"
        );
    }

    pub fn log_startup(&self, version: &str, preload: bool) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            preload_models = preload,
            "Screw classification service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Screw classification service shutting down"
        );
    }
}
