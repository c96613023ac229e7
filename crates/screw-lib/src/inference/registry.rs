//! Process-wide, lazily loaded classifier instances

use super::{Classifier, ModelLoader};
use crate::error::InferenceError;
use crate::models::ModelTarget;
use crate::observability::ClassifierMetrics;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{error, info};

/// Memoized load result; failures are kept so they are not retried
type LoadOutcome = Result<Arc<dyn Classifier>, String>;

/// Load state of one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    NotLoaded,
    Ready,
    Failed(String),
}

/// Holds the two classifiers, each behind a once-only initializer.
///
/// The first caller for a target runs the load; concurrent callers block
/// until it finishes and then share the same outcome.
pub struct ModelRegistry {
    loader: Box<dyn ModelLoader>,
    torque_only: OnceLock<LoadOutcome>,
    multi_feature: OnceLock<LoadOutcome>,
}

impl ModelRegistry {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            torque_only: OnceLock::new(),
            multi_feature: OnceLock::new(),
        }
    }

    fn slot(&self, target: ModelTarget) -> &OnceLock<LoadOutcome> {
        match target {
            ModelTarget::TorqueOnly => &self.torque_only,
            ModelTarget::MultiFeature => &self.multi_feature,
        }
    }

    /// Get the classifier for a target, loading it on first use
    pub fn classifier(&self, target: ModelTarget) -> Result<Arc<dyn Classifier>, InferenceError> {
        self.slot(target)
            .get_or_init(|| self.load(target))
            .clone()
            .map_err(|reason| InferenceError::ModelUnavailable { target, reason })
    }

    /// Load every model now instead of on first prediction
    pub fn preload(&self) -> Vec<(ModelTarget, Result<(), InferenceError>)> {
        ModelTarget::ALL
            .into_iter()
            .map(|target| (target, self.classifier(target).map(|_| ())))
            .collect()
    }

    pub fn status(&self, target: ModelTarget) -> ModelStatus {
        match self.slot(target).get() {
            None => ModelStatus::NotLoaded,
            Some(Ok(_)) => ModelStatus::Ready,
            Some(Err(reason)) => ModelStatus::Failed(reason.clone()),
        }
    }

    fn load(&self, target: ModelTarget) -> LoadOutcome {
        let start = Instant::now();
        let metrics = ClassifierMetrics::new();

        match self.loader.load(target) {
            Ok(classifier) => {
                let elapsed = start.elapsed();
                metrics.observe_model_load_latency(elapsed.as_secs_f64());
                metrics.set_model_loaded(target, true);
                info!(
                    event = "model_loaded",
                    model_target = %target,
                    model = %classifier.describe(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Classifier loaded"
                );
                Ok(classifier)
            }
            Err(e) => {
                metrics.set_model_loaded(target, false);
                error!(
                    event = "model_load_failed",
                    model_target = %target,
                    error = %format!("{:#}", e),
                    "Classifier failed to load"
                );
                Err(format!("{:#}", e))
            }
        }
    }
}
