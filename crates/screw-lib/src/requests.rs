//! Request and response bodies shared by the server and the CLI

use crate::error::{InferenceError, ValidationError};
use crate::models::{
    BinaryFlag, FeatureName, MetadataChoices, PredictionMode, ScenarioCondition, SeriesFeature,
    WorkpieceLocation, WorkpieceResult,
};
use crate::pipeline::{FeatureSelection, Prediction, RawInputs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Torque-only submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorqueRequest {
    pub time: String,
    pub torque: String,
}

impl TorqueRequest {
    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs::new(self.time.clone()).with_series(SeriesFeature::Torque, self.torque.clone())
    }
}

/// Metadata fields of a custom submission; a present field is enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workpiece_location: Option<WorkpieceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workpiece_usage: Option<BinaryFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workpiece_result: Option<WorkpieceResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_condition: Option<ScenarioCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_exception: Option<BinaryFlag>,
}

impl MetadataInput {
    /// Every field set to the given choices
    pub fn all(choices: MetadataChoices) -> Self {
        Self {
            workpiece_location: Some(choices.workpiece_location),
            workpiece_usage: Some(choices.workpiece_usage),
            workpiece_result: Some(choices.workpiece_result),
            scenario_condition: Some(choices.scenario_condition),
            scenario_exception: Some(choices.scenario_exception),
        }
    }

    /// Only the fields enabled in the selection
    pub fn selected(choices: MetadataChoices, selection: &FeatureSelection) -> Self {
        let pick = |name: FeatureName| selection.is_enabled(name);
        Self {
            workpiece_location: pick(FeatureName::WorkpieceLocation)
                .then_some(choices.workpiece_location),
            workpiece_usage: pick(FeatureName::WorkpieceUsage).then_some(choices.workpiece_usage),
            workpiece_result: pick(FeatureName::WorkpieceResult)
                .then_some(choices.workpiece_result),
            scenario_condition: pick(FeatureName::ScenarioCondition)
                .then_some(choices.scenario_condition),
            scenario_exception: pick(FeatureName::ScenarioException)
                .then_some(choices.scenario_exception),
        }
    }

    fn is_set(&self, field: FeatureName) -> bool {
        match field {
            FeatureName::WorkpieceLocation => self.workpiece_location.is_some(),
            FeatureName::WorkpieceUsage => self.workpiece_usage.is_some(),
            FeatureName::WorkpieceResult => self.workpiece_result.is_some(),
            FeatureName::ScenarioCondition => self.scenario_condition.is_some(),
            FeatureName::ScenarioException => self.scenario_exception.is_some(),
            _ => false,
        }
    }

    /// Set fields as choices, unset ones falling back to defaults
    fn choices(&self) -> MetadataChoices {
        let defaults = MetadataChoices::default();
        MetadataChoices {
            workpiece_location: self
                .workpiece_location
                .unwrap_or(defaults.workpiece_location),
            workpiece_usage: self.workpiece_usage.unwrap_or(defaults.workpiece_usage),
            workpiece_result: self.workpiece_result.unwrap_or(defaults.workpiece_result),
            scenario_condition: self
                .scenario_condition
                .unwrap_or(defaults.scenario_condition),
            scenario_exception: self
                .scenario_exception
                .unwrap_or(defaults.scenario_exception),
        }
    }
}

/// Multi-feature submission; present series keys are the enabled series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRequest {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub series: BTreeMap<SeriesFeature, String>,
    #[serde(default)]
    pub metadata: MetadataInput,
}

impl CustomRequest {
    pub fn selection(&self) -> FeatureSelection {
        let mut selection = FeatureSelection::none();
        for feature in self.series.keys() {
            selection.set(feature.name(), true);
        }
        for field in FeatureName::METADATA {
            selection.set(field, self.metadata.is_set(field));
        }
        selection
    }

    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs {
            time_text: self.time.clone(),
            series_text: self.series.clone(),
            metadata: self.metadata.choices(),
        }
    }
}

/// Successful prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub mode: PredictionMode,
    pub label: String,
    pub features: Vec<FeatureName>,
    pub elapsed_us: u64,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            mode: prediction.mode,
            label: prediction.label.to_string(),
            features: prediction.features,
            elapsed_us: prediction.elapsed_us,
        }
    }
}

/// Error body returned for rejected submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_features: Vec<FeatureName>,
}

impl ErrorResponse {
    pub fn validation(error: &ValidationError) -> Self {
        Self {
            error: "validation".to_string(),
            message: error.to_string(),
            invalid_features: error.invalid_features(),
        }
    }

    /// Generic message; the detail stays in the server log
    pub fn inference(error: &InferenceError) -> Self {
        let message = match error {
            InferenceError::ModelUnavailable { target, .. } => {
                format!("Prediction failed: the {} model is unavailable", target)
            }
            _ => "Prediction failed: the classifier could not process this input".to_string(),
        };
        Self {
            error: "inference".to_string(),
            message,
            invalid_features: Vec::new(),
        }
    }

    pub fn internal() -> Self {
        Self {
            error: "internal".to_string(),
            message: "Prediction failed: internal error".to_string(),
            invalid_features: Vec::new(),
        }
    }
}

/// Description of a prediction mode for the home screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub mode: PredictionMode,
    pub title: String,
    pub description: String,
    pub required: Vec<FeatureName>,
    pub optional: Vec<FeatureName>,
}

/// The two modes offered to the user
pub fn mode_catalog() -> Vec<ModeInfo> {
    vec![
        ModeInfo {
            mode: PredictionMode::TorqueOnly,
            title: "Torque-Only Classification".to_string(),
            description: "Predict the workpiece result from the torque curve alone".to_string(),
            required: vec![FeatureName::TorqueValues],
            optional: Vec::new(),
        },
        ModeInfo {
            mode: PredictionMode::Custom,
            title: "Custom Feature Classification".to_string(),
            description: "Predict the workpiece result from any selection of sensor series \
                          and workpiece metadata"
                .to_string(),
            required: Vec::new(),
            optional: FeatureName::ALL.to_vec(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_custom_request_json_shape() {
        let json = r#"{
            "time": "0.0,0.001",
            "series": {"torque_values": "0.1,0.2", "step_values": "0,1"},
            "metadata": {"workpiece_location": "middle", "scenario_exception": 1}
        }"#;
        let request: CustomRequest = serde_json::from_str(json).unwrap();

        let selection = request.selection();
        let enabled: Vec<_> = selection.enabled().collect();
        assert_eq!(
            enabled,
            vec![
                FeatureName::TorqueValues,
                FeatureName::StepValues,
                FeatureName::WorkpieceLocation,
                FeatureName::ScenarioException
            ]
        );

        let inputs = request.raw_inputs();
        assert_eq!(inputs.series_text(SeriesFeature::Step), "0,1");
        assert_eq!(inputs.metadata.workpiece_location, WorkpieceLocation::Middle);
        assert_eq!(inputs.metadata.scenario_exception, BinaryFlag::One);
    }

    #[test]
    fn test_custom_request_defaults_to_empty() {
        let request: CustomRequest = serde_json::from_str("{}").unwrap();
        assert!(request.selection().is_empty());
    }

    #[test]
    fn test_unknown_series_key_is_rejected() {
        let json = r#"{"time": "0", "series": {"pressure_values": "1"}}"#;
        assert!(serde_json::from_str::<CustomRequest>(json).is_err());
    }

    #[test]
    fn test_misspelled_metadata_field_is_rejected() {
        let json = r#"{"time": "0", "metadata": {"workpiece_loc": "left"}}"#;
        let err = serde_json::from_str::<CustomRequest>(json).unwrap_err();
        assert!(err.to_string().contains("workpiece_loc"));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        let json = r#"{"time": "0", "serie": {"torque_values": "1"}}"#;
        assert!(serde_json::from_str::<CustomRequest>(json).is_err());
    }

    #[test]
    fn test_metadata_selected_round_trip() {
        let mut selection = FeatureSelection::none();
        selection.set(FeatureName::WorkpieceUsage, true);
        let choices = MetadataChoices {
            workpiece_usage: BinaryFlag::One,
            ..Default::default()
        };

        let input = MetadataInput::selected(choices, &selection);
        assert_eq!(input.workpiece_usage, Some(BinaryFlag::One));
        assert!(input.workpiece_location.is_none());

        let json = serde_json::to_value(input).unwrap();
        assert_eq!(json, serde_json::json!({"workpiece_usage": 1}));
    }

    #[test]
    fn test_error_responses() {
        let validation = ValidationError::new(vec![(FeatureName::AngleValues, ParseError::EmptySeries)]);
        let body = ErrorResponse::validation(&validation);
        assert_eq!(body.error, "validation");
        assert_eq!(body.message, "Invalid input in: angle_values");
        assert_eq!(body.invalid_features, vec![FeatureName::AngleValues]);

        let inference = InferenceError::Classifier {
            target: crate::models::ModelTarget::MultiFeature,
            reason: "shape mismatch in node 12".to_string(),
        };
        let body = ErrorResponse::inference(&inference);
        assert!(!body.message.contains("node 12"));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("invalid_features").is_none());
    }

    #[test]
    fn test_mode_catalog() {
        let modes = mode_catalog();
        assert_eq!(modes.len(), 2);
        assert_eq!(modes[0].required, vec![FeatureName::TorqueValues]);
        assert_eq!(modes[1].optional.len(), FeatureName::COUNT);
    }
}
