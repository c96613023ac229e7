//! Feature record assembly and the validation gate
//!
//! Enabled series are parsed against the shared time text, enabled
//! metadata fields are copied from the user's choices, and the finished
//! record is rejected if any series slot holds the empty marker.

use super::parser::parse_series;
use super::record::FeatureRecord;
use crate::error::{ParseError, ValidationError};
use crate::models::{FeatureName, MetadataChoices, SeriesFeature, TimeSeries};
use std::collections::BTreeMap;
use tracing::debug;

/// Which features the user switched on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureSelection {
    enabled: [bool; FeatureName::COUNT],
}

impl FeatureSelection {
    /// Nothing enabled
    pub fn none() -> Self {
        Self::default()
    }

    /// Every series and every metadata field
    pub fn all() -> Self {
        Self {
            enabled: [true; FeatureName::COUNT],
        }
    }

    pub fn torque_only() -> Self {
        Self::none().with(FeatureName::TorqueValues)
    }

    pub fn with(mut self, name: FeatureName) -> Self {
        self.set(name, true);
        self
    }

    pub fn set(&mut self, name: FeatureName, enabled: bool) {
        self.enabled[name.index()] = enabled;
    }

    /// Switch all five metadata fields together
    pub fn set_metadata(&mut self, enabled: bool) {
        for field in FeatureName::METADATA {
            self.set(field, enabled);
        }
    }

    pub fn is_enabled(&self, name: FeatureName) -> bool {
        self.enabled[name.index()]
    }

    pub fn enabled(&self) -> impl Iterator<Item = FeatureName> + '_ {
        FeatureName::ALL
            .into_iter()
            .filter(|name| self.is_enabled(*name))
    }

    pub fn is_empty(&self) -> bool {
        self.enabled().next().is_none()
    }
}

/// Raw user input before parsing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInputs {
    /// Time text shared by every series
    pub time_text: String,
    pub series_text: BTreeMap<SeriesFeature, String>,
    pub metadata: MetadataChoices,
}

impl RawInputs {
    pub fn new(time_text: impl Into<String>) -> Self {
        Self {
            time_text: time_text.into(),
            ..Default::default()
        }
    }

    pub fn with_series(mut self, feature: SeriesFeature, text: impl Into<String>) -> Self {
        self.series_text.insert(feature, text.into());
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataChoices) -> Self {
        self.metadata = metadata;
        self
    }

    /// Value text for a series; missing text reads as empty
    pub fn series_text(&self, feature: SeriesFeature) -> &str {
        self.series_text
            .get(&feature)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Build a validated record from the enabled features.
///
/// A selection with nothing enabled yields an empty record; whether that
/// is acceptable is up to the classifier.
pub fn assemble(
    selection: &FeatureSelection,
    inputs: &RawInputs,
) -> Result<FeatureRecord, ValidationError> {
    let mut record = FeatureRecord::new();
    let mut reasons: Vec<(FeatureName, ParseError)> = Vec::new();

    for feature in SeriesFeature::ALL {
        if !selection.is_enabled(feature.name()) {
            continue;
        }
        let series = match parse_series(&inputs.time_text, inputs.series_text(feature)) {
            Ok(series) => series,
            Err(e) => {
                debug!(feature = %feature, error = %e, "Series input rejected");
                reasons.push((feature.name(), e));
                TimeSeries::empty()
            }
        };
        record.insert_series(feature, series);
    }

    for field in FeatureName::METADATA {
        if !selection.is_enabled(field) {
            continue;
        }
        if let Some(value) = inputs.metadata.value_for(field) {
            record.insert_scalar(value);
        }
    }

    validate(record, reasons)
}

/// Reject a record holding any empty series
fn validate(
    record: FeatureRecord,
    mut reasons: Vec<(FeatureName, ParseError)>,
) -> Result<FeatureRecord, ValidationError> {
    let invalid = record.invalid_series();
    if invalid.is_empty() {
        return Ok(record);
    }

    let failures = invalid
        .into_iter()
        .map(|name| {
            let reason = reasons
                .iter()
                .position(|(failed, _)| *failed == name)
                .map(|ix| reasons.swap_remove(ix).1)
                .unwrap_or(ParseError::EmptySeries);
            (name, reason)
        })
        .collect();

    Err(ValidationError::new(failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureValue, ScalarValue, WorkpieceLocation};

    const TIME: &str = "0.0,0.001,0.002,0.003";

    fn full_inputs() -> RawInputs {
        RawInputs::new(TIME)
            .with_series(SeriesFeature::Torque, "0.1,0.2,0.15,0.25")
            .with_series(SeriesFeature::Angle, "2.5,5.25,6.25,7.0")
            .with_series(SeriesFeature::Gradient, "0.01,0.02,0.03,0.04")
            .with_series(SeriesFeature::Step, "0,0,1,1")
    }

    #[test]
    fn test_assembles_all_enabled_features() {
        let record = assemble(&FeatureSelection::all(), &full_inputs()).unwrap();
        assert_eq!(record.len(), FeatureName::COUNT);
        assert_eq!(
            record.series(SeriesFeature::Step).unwrap().values(),
            &[0.0, 0.0, 1.0, 1.0]
        );
        assert_eq!(
            record.get(FeatureName::WorkpieceLocation),
            Some(&FeatureValue::Scalar(ScalarValue::WorkpieceLocation(
                WorkpieceLocation::Left
            )))
        );
    }

    #[test]
    fn test_disabled_features_are_left_out() {
        let selection = FeatureSelection::none()
            .with(FeatureName::AngleValues)
            .with(FeatureName::ScenarioCondition);
        let record = assemble(&selection, &full_inputs()).unwrap();
        assert_eq!(
            record.names(),
            vec![FeatureName::AngleValues, FeatureName::ScenarioCondition]
        );
    }

    #[test]
    fn test_single_malformed_feature_is_named() {
        let inputs = RawInputs::new(TIME).with_series(SeriesFeature::Torque, "0.1,oops,0.15,0.25");
        let err = assemble(&FeatureSelection::torque_only(), &inputs).unwrap_err();
        assert_eq!(err.invalid_features(), vec![FeatureName::TorqueValues]);
        assert!(matches!(
            err.failures()[0].1,
            ParseError::InvalidNumber { position: 1, .. }
        ));
    }

    #[test]
    fn test_every_malformed_feature_is_reported() {
        let inputs = full_inputs()
            .with_series(SeriesFeature::Angle, "1,2")
            .with_series(SeriesFeature::Step, "");
        let err = assemble(&FeatureSelection::all(), &inputs).unwrap_err();
        assert_eq!(
            err.invalid_features(),
            vec![FeatureName::AngleValues, FeatureName::StepValues]
        );
        assert_eq!(err.to_string(), "Invalid input in: angle_values, step_values");
    }

    #[test]
    fn test_bad_time_text_fails_every_series() {
        let mut inputs = full_inputs();
        inputs.time_text = "0.0,0.001".to_string();
        let selection = FeatureSelection::none()
            .with(FeatureName::TorqueValues)
            .with(FeatureName::GradientValues);
        let err = assemble(&selection, &inputs).unwrap_err();
        assert_eq!(
            err.invalid_features(),
            vec![FeatureName::TorqueValues, FeatureName::GradientValues]
        );
    }

    #[test]
    fn test_missing_value_text_is_invalid() {
        let inputs = RawInputs::new(TIME);
        let err = assemble(&FeatureSelection::torque_only(), &inputs).unwrap_err();
        assert_eq!(err.invalid_features(), vec![FeatureName::TorqueValues]);
    }

    #[test]
    fn test_empty_selection_passes_validation() {
        let record = assemble(&FeatureSelection::none(), &RawInputs::default()).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_metadata_toggle_switches_all_fields() {
        let mut selection = FeatureSelection::none();
        selection.set_metadata(true);
        let record = assemble(&selection, &RawInputs::default()).unwrap();
        assert_eq!(record.names(), FeatureName::METADATA.to_vec());

        selection.set_metadata(false);
        assert!(selection.is_empty());
    }
}
