//! Dispatch of an assembled record to the matching classifier

use super::record::FeatureRecord;
use crate::error::InferenceError;
use crate::inference::ModelRegistry;
use crate::models::{FeatureName, Label, PredictionMode};
use std::sync::Arc;
use tracing::debug;

/// Routes records to the torque-only or the multi-feature classifier
#[derive(Clone)]
pub struct ModelRouter {
    models: Arc<ModelRegistry>,
}

impl ModelRouter {
    pub fn new(models: Arc<ModelRegistry>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Predict a label for the record and return the first one.
    ///
    /// Torque-only mode accepts exactly `torque_values`. Custom mode passes
    /// whatever the record holds, including nothing, to the multi-feature
    /// classifier.
    pub fn route(
        &self,
        mode: PredictionMode,
        record: &FeatureRecord,
    ) -> Result<Label, InferenceError> {
        let target = mode.target();

        if mode == PredictionMode::TorqueOnly {
            let found = record.names();
            if found != [FeatureName::TorqueValues] {
                return Err(InferenceError::UnexpectedFeatures { target, found });
            }
        }

        let classifier = self.models.classifier(target)?;
        debug!(model_target = %target, features = record.len(), "Dispatching record");

        let labels = classifier
            .predict(record)
            .map_err(|e| InferenceError::Classifier {
                target,
                reason: format!("{:#}", e),
            })?;

        labels
            .into_iter()
            .next()
            .ok_or(InferenceError::EmptyPrediction { target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{Classifier, ModelLoader};
    use crate::models::{ModelTarget, ScalarValue, SeriesFeature, TimeSeries, WorkpieceLocation};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed label sequence and counts calls per target
    struct ScriptedClassifier {
        labels: Vec<Label>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Classifier for ScriptedClassifier {
        fn predict(&self, _record: &FeatureRecord) -> anyhow::Result<Vec<Label>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("unexpected schema");
            }
            Ok(self.labels.clone())
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    struct ScriptedLoader {
        torque_calls: Arc<AtomicUsize>,
        multi_calls: Arc<AtomicUsize>,
        multi_labels: Vec<Label>,
        multi_fails: bool,
    }

    impl ModelLoader for ScriptedLoader {
        fn load(&self, target: ModelTarget) -> anyhow::Result<Arc<dyn Classifier>> {
            let classifier = match target {
                ModelTarget::TorqueOnly => ScriptedClassifier {
                    labels: vec![Label::from("NOK"), Label::from("OK")],
                    calls: self.torque_calls.clone(),
                    fail: false,
                },
                ModelTarget::MultiFeature => ScriptedClassifier {
                    labels: self.multi_labels.clone(),
                    calls: self.multi_calls.clone(),
                    fail: self.multi_fails,
                },
            };
            Ok(Arc::new(classifier))
        }
    }

    struct Fixture {
        router: ModelRouter,
        torque_calls: Arc<AtomicUsize>,
        multi_calls: Arc<AtomicUsize>,
    }

    fn fixture(multi_labels: Vec<Label>, multi_fails: bool) -> Fixture {
        let torque_calls = Arc::new(AtomicUsize::new(0));
        let multi_calls = Arc::new(AtomicUsize::new(0));
        let loader = ScriptedLoader {
            torque_calls: torque_calls.clone(),
            multi_calls: multi_calls.clone(),
            multi_labels,
            multi_fails,
        };
        Fixture {
            router: ModelRouter::new(Arc::new(ModelRegistry::new(loader))),
            torque_calls,
            multi_calls,
        }
    }

    fn torque_record() -> FeatureRecord {
        let mut record = FeatureRecord::new();
        let series = TimeSeries::new(vec![0.0, 0.001], vec![0.1, 0.2]).unwrap();
        record.insert_series(SeriesFeature::Torque, series);
        record
    }

    #[test]
    fn test_torque_only_calls_torque_classifier_once() {
        let f = fixture(vec![Label::from("OK")], false);
        let label = f
            .router
            .route(PredictionMode::TorqueOnly, &torque_record())
            .unwrap();

        assert_eq!(label, Label::from("NOK"));
        assert_eq!(f.torque_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.multi_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_torque_only_rejects_other_features() {
        let f = fixture(vec![Label::from("OK")], false);
        let mut record = torque_record();
        record.insert_scalar(ScalarValue::WorkpieceLocation(WorkpieceLocation::Left));

        let err = f.router.route(PredictionMode::TorqueOnly, &record).unwrap_err();
        assert!(matches!(err, InferenceError::UnexpectedFeatures { .. }));
        assert_eq!(f.torque_calls.load(Ordering::SeqCst), 0);

        let err = f
            .router
            .route(PredictionMode::TorqueOnly, &FeatureRecord::new())
            .unwrap_err();
        assert!(matches!(err, InferenceError::UnexpectedFeatures { .. }));
    }

    #[test]
    fn test_custom_with_empty_record_reaches_classifier() {
        let f = fixture(vec![Label::from("OK")], false);
        let label = f
            .router
            .route(PredictionMode::Custom, &FeatureRecord::new())
            .unwrap();

        assert_eq!(label, Label::from("OK"));
        assert_eq!(f.multi_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classifier_failure_becomes_inference_error() {
        let f = fixture(vec![], true);
        let err = f
            .router
            .route(PredictionMode::Custom, &torque_record())
            .unwrap_err();
        assert_eq!(
            err,
            InferenceError::Classifier {
                target: ModelTarget::MultiFeature,
                reason: "unexpected schema".to_string()
            }
        );
    }

    #[test]
    fn test_empty_prediction_is_an_error() {
        let f = fixture(vec![], false);
        let err = f
            .router
            .route(PredictionMode::Custom, &torque_record())
            .unwrap_err();
        assert_eq!(
            err,
            InferenceError::EmptyPrediction {
                target: ModelTarget::MultiFeature
            }
        );
    }
}
