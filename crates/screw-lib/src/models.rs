//! Core data models for screw tightening classification

use crate::error::{ChoiceError, ParseError};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One sensor channel of a tightening event, indexed by timestamp.
///
/// A zero-length series is the canonical invalid marker. Timestamps are
/// neither required to be sorted nor unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(timestamps: Vec<f64>, values: Vec<f64>) -> Result<Self, ParseError> {
        if timestamps.len() != values.len() {
            return Err(ParseError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }
        if timestamps.is_empty() {
            return Err(ParseError::EmptySeries);
        }
        Ok(Self { timestamps, values })
    }

    /// The invalid marker stored for a series that failed to parse
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (timestamp, value) pairs in input order
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimeSeries", 2)?;
        state.serialize_field("timestamps", &self.timestamps)?;
        state.serialize_field("values", &self.values)?;
        state.end()
    }
}

/// Every key a feature record can hold, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    TorqueValues,
    AngleValues,
    GradientValues,
    StepValues,
    WorkpieceLocation,
    WorkpieceUsage,
    WorkpieceResult,
    ScenarioCondition,
    ScenarioException,
}

impl FeatureName {
    pub const COUNT: usize = 9;

    pub const ALL: [FeatureName; Self::COUNT] = [
        FeatureName::TorqueValues,
        FeatureName::AngleValues,
        FeatureName::GradientValues,
        FeatureName::StepValues,
        FeatureName::WorkpieceLocation,
        FeatureName::WorkpieceUsage,
        FeatureName::WorkpieceResult,
        FeatureName::ScenarioCondition,
        FeatureName::ScenarioException,
    ];

    pub const METADATA: [FeatureName; 5] = [
        FeatureName::WorkpieceLocation,
        FeatureName::WorkpieceUsage,
        FeatureName::WorkpieceResult,
        FeatureName::ScenarioCondition,
        FeatureName::ScenarioException,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::TorqueValues => "torque_values",
            FeatureName::AngleValues => "angle_values",
            FeatureName::GradientValues => "gradient_values",
            FeatureName::StepValues => "step_values",
            FeatureName::WorkpieceLocation => "workpiece_location",
            FeatureName::WorkpieceUsage => "workpiece_usage",
            FeatureName::WorkpieceResult => "workpiece_result",
            FeatureName::ScenarioCondition => "scenario_condition",
            FeatureName::ScenarioException => "scenario_exception",
        }
    }

    pub fn is_series(&self) -> bool {
        self.series().is_some()
    }

    pub fn series(&self) -> Option<SeriesFeature> {
        match self {
            FeatureName::TorqueValues => Some(SeriesFeature::Torque),
            FeatureName::AngleValues => Some(SeriesFeature::Angle),
            FeatureName::GradientValues => Some(SeriesFeature::Gradient),
            FeatureName::StepValues => Some(SeriesFeature::Step),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| {
                ChoiceError::new(
                    "feature",
                    s,
                    "torque_values, angle_values, gradient_values, step_values, \
                     workpiece_location, workpiece_usage, workpiece_result, \
                     scenario_condition, scenario_exception",
                )
            })
    }
}

/// The four sensor channels that carry time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeriesFeature {
    #[serde(rename = "torque_values")]
    Torque,
    #[serde(rename = "angle_values")]
    Angle,
    #[serde(rename = "gradient_values")]
    Gradient,
    #[serde(rename = "step_values")]
    Step,
}

impl SeriesFeature {
    pub const ALL: [SeriesFeature; 4] = [
        SeriesFeature::Torque,
        SeriesFeature::Angle,
        SeriesFeature::Gradient,
        SeriesFeature::Step,
    ];

    pub fn name(&self) -> FeatureName {
        match self {
            SeriesFeature::Torque => FeatureName::TorqueValues,
            SeriesFeature::Angle => FeatureName::AngleValues,
            SeriesFeature::Gradient => FeatureName::GradientValues,
            SeriesFeature::Step => FeatureName::StepValues,
        }
    }

    /// Short label used in prompts and CLI flags
    pub fn label(&self) -> &'static str {
        match self {
            SeriesFeature::Torque => "torque",
            SeriesFeature::Angle => "angle",
            SeriesFeature::Gradient => "gradient",
            SeriesFeature::Step => "step",
        }
    }
}

impl fmt::Display for SeriesFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().as_str())
    }
}

impl FromStr for SeriesFeature {
    type Err = ChoiceError;

    /// Accepts both the short label (`torque`) and the feature name (`torque_values`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeriesFeature::ALL
            .into_iter()
            .find(|f| f.label() == s || f.name().as_str() == s)
            .ok_or_else(|| ChoiceError::new("series", s, "torque, angle, gradient, step"))
    }
}

/// Position of the workpiece in the fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkpieceLocation {
    #[default]
    Left,
    Middle,
    Right,
}

impl WorkpieceLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkpieceLocation::Left => "left",
            WorkpieceLocation::Middle => "middle",
            WorkpieceLocation::Right => "right",
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            WorkpieceLocation::Left => 0,
            WorkpieceLocation::Middle => 1,
            WorkpieceLocation::Right => 2,
        }
    }
}

impl FromStr for WorkpieceLocation {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(WorkpieceLocation::Left),
            "middle" => Ok(WorkpieceLocation::Middle),
            "right" => Ok(WorkpieceLocation::Right),
            _ => Err(ChoiceError::new("workpiece location", s, "left, middle, right")),
        }
    }
}

/// A 0/1 metadata field (`workpiece_usage`, `scenario_exception`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BinaryFlag {
    #[default]
    Zero,
    One,
}

impl BinaryFlag {
    pub fn code(&self) -> i64 {
        match self {
            BinaryFlag::Zero => 0,
            BinaryFlag::One => 1,
        }
    }
}

impl From<BinaryFlag> for u8 {
    fn from(flag: BinaryFlag) -> u8 {
        match flag {
            BinaryFlag::Zero => 0,
            BinaryFlag::One => 1,
        }
    }
}

impl TryFrom<u8> for BinaryFlag {
    type Error = ChoiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BinaryFlag::Zero),
            1 => Ok(BinaryFlag::One),
            other => Err(ChoiceError::new("flag", other.to_string(), "0, 1")),
        }
    }
}

impl FromStr for BinaryFlag {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(BinaryFlag::Zero),
            "1" => Ok(BinaryFlag::One),
            _ => Err(ChoiceError::new("flag", s, "0, 1")),
        }
    }
}

/// Recorded result of the workpiece
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkpieceResult {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOK")]
    Nok,
}

impl WorkpieceResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkpieceResult::Ok => "OK",
            WorkpieceResult::Nok => "NOK",
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            WorkpieceResult::Ok => 0,
            WorkpieceResult::Nok => 1,
        }
    }
}

impl FromStr for WorkpieceResult {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(WorkpieceResult::Ok),
            "NOK" => Ok(WorkpieceResult::Nok),
            _ => Err(ChoiceError::new("workpiece result", s, "OK, NOK")),
        }
    }
}

/// Condition the tightening scenario ran under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioCondition {
    #[default]
    Normal,
    Abnormal,
}

impl ScenarioCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioCondition::Normal => "normal",
            ScenarioCondition::Abnormal => "abnormal",
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ScenarioCondition::Normal => 0,
            ScenarioCondition::Abnormal => 1,
        }
    }
}

impl FromStr for ScenarioCondition {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(ScenarioCondition::Normal),
            "abnormal" => Ok(ScenarioCondition::Abnormal),
            _ => Err(ChoiceError::new("scenario condition", s, "normal, abnormal")),
        }
    }
}

/// A metadata value, tagged with the field it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarValue {
    WorkpieceLocation(WorkpieceLocation),
    WorkpieceUsage(BinaryFlag),
    WorkpieceResult(WorkpieceResult),
    ScenarioCondition(ScenarioCondition),
    ScenarioException(BinaryFlag),
}

impl ScalarValue {
    pub fn feature(&self) -> FeatureName {
        match self {
            ScalarValue::WorkpieceLocation(_) => FeatureName::WorkpieceLocation,
            ScalarValue::WorkpieceUsage(_) => FeatureName::WorkpieceUsage,
            ScalarValue::WorkpieceResult(_) => FeatureName::WorkpieceResult,
            ScalarValue::ScenarioCondition(_) => FeatureName::ScenarioCondition,
            ScalarValue::ScenarioException(_) => FeatureName::ScenarioException,
        }
    }

    /// Categorical code fed to the classifier graph
    pub fn code(&self) -> i64 {
        match self {
            ScalarValue::WorkpieceLocation(v) => v.code(),
            ScalarValue::WorkpieceUsage(v) | ScalarValue::ScenarioException(v) => v.code(),
            ScalarValue::WorkpieceResult(v) => v.code(),
            ScalarValue::ScenarioCondition(v) => v.code(),
        }
    }

    /// Parse the text of a choice for the given metadata field
    pub fn parse(field: FeatureName, text: &str) -> Result<Self, ChoiceError> {
        match field {
            FeatureName::WorkpieceLocation => text.parse().map(ScalarValue::WorkpieceLocation),
            FeatureName::WorkpieceUsage => text.parse().map(ScalarValue::WorkpieceUsage),
            FeatureName::WorkpieceResult => text.parse().map(ScalarValue::WorkpieceResult),
            FeatureName::ScenarioCondition => text.parse().map(ScalarValue::ScenarioCondition),
            FeatureName::ScenarioException => text.parse().map(ScalarValue::ScenarioException),
            series => Err(ChoiceError::new(
                "metadata field",
                series.as_str(),
                "workpiece_location, workpiece_usage, workpiece_result, \
                 scenario_condition, scenario_exception",
            )),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::WorkpieceLocation(v) => f.write_str(v.as_str()),
            ScalarValue::WorkpieceUsage(v) | ScalarValue::ScenarioException(v) => {
                write!(f, "{}", v.code())
            }
            ScalarValue::WorkpieceResult(v) => f.write_str(v.as_str()),
            ScalarValue::ScenarioCondition(v) => f.write_str(v.as_str()),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::WorkpieceUsage(v) | ScalarValue::ScenarioException(v) => {
                serializer.serialize_u8(u8::from(*v))
            }
            other => serializer.collect_str(other),
        }
    }
}

/// Value held by one slot of a feature record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Series(TimeSeries),
    Scalar(ScalarValue),
}

impl FeatureValue {
    pub fn as_series(&self) -> Option<&TimeSeries> {
        match self {
            FeatureValue::Series(series) => Some(series),
            FeatureValue::Scalar(_) => None,
        }
    }
}

/// The full set of metadata choices offered to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataChoices {
    #[serde(default)]
    pub workpiece_location: WorkpieceLocation,
    #[serde(default)]
    pub workpiece_usage: BinaryFlag,
    #[serde(default)]
    pub workpiece_result: WorkpieceResult,
    #[serde(default)]
    pub scenario_condition: ScenarioCondition,
    #[serde(default)]
    pub scenario_exception: BinaryFlag,
}

impl MetadataChoices {
    /// Current choice for a metadata field, `None` for series features
    pub fn value_for(&self, field: FeatureName) -> Option<ScalarValue> {
        match field {
            FeatureName::WorkpieceLocation => {
                Some(ScalarValue::WorkpieceLocation(self.workpiece_location))
            }
            FeatureName::WorkpieceUsage => Some(ScalarValue::WorkpieceUsage(self.workpiece_usage)),
            FeatureName::WorkpieceResult => {
                Some(ScalarValue::WorkpieceResult(self.workpiece_result))
            }
            FeatureName::ScenarioCondition => {
                Some(ScalarValue::ScenarioCondition(self.scenario_condition))
            }
            FeatureName::ScenarioException => {
                Some(ScalarValue::ScenarioException(self.scenario_exception))
            }
            _ => None,
        }
    }

    pub fn set(&mut self, value: ScalarValue) {
        match value {
            ScalarValue::WorkpieceLocation(v) => self.workpiece_location = v,
            ScalarValue::WorkpieceUsage(v) => self.workpiece_usage = v,
            ScalarValue::WorkpieceResult(v) => self.workpiece_result = v,
            ScalarValue::ScenarioCondition(v) => self.scenario_condition = v,
            ScalarValue::ScenarioException(v) => self.scenario_exception = v,
        }
    }
}

/// Predicted workpiece result as produced by a classifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// The two pre-trained classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTarget {
    TorqueOnly,
    MultiFeature,
}

impl ModelTarget {
    pub const ALL: [ModelTarget; 2] = [ModelTarget::TorqueOnly, ModelTarget::MultiFeature];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTarget::TorqueOnly => "torque_only",
            ModelTarget::MultiFeature => "multi_feature",
        }
    }

    /// Component name used for health reporting
    pub fn component(&self) -> &'static str {
        match self {
            ModelTarget::TorqueOnly => "torque_model",
            ModelTarget::MultiFeature => "multi_feature_model",
        }
    }
}

impl fmt::Display for ModelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inference mode chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    TorqueOnly,
    Custom,
}

impl PredictionMode {
    pub fn target(&self) -> ModelTarget {
        match self {
            PredictionMode::TorqueOnly => ModelTarget::TorqueOnly,
            PredictionMode::Custom => ModelTarget::MultiFeature,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionMode::TorqueOnly => "torque_only",
            PredictionMode::Custom => "custom",
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
