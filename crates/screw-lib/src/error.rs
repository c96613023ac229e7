//! Error taxonomy for the classification pipeline
//!
//! Parse failures stay local to a single series and are folded into a
//! [`ValidationError`] during assembly. Inference failures cover both
//! model loading and the classifier call itself.

use crate::models::{FeatureName, ModelTarget};
use std::fmt;
use thiserror::Error;

/// Which of the two input texts of a series a parse error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Time,
    Value,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Time => f.write_str("time"),
            Channel::Value => f.write_str("value"),
        }
    }
}

/// Failure to turn delimited text into a time series
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty {channel} token at position {position}")]
    EmptyToken { channel: Channel, position: usize },

    #[error("{channel} token '{token}' at position {position} is not a number")]
    InvalidNumber {
        channel: Channel,
        position: usize,
        token: String,
    },

    #[error("{timestamps} timestamps but {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("series has no samples")]
    EmptySeries,
}

/// One or more enabled series could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid input in: {}", join_names(.failures))]
pub struct ValidationError {
    failures: Vec<(FeatureName, ParseError)>,
}

fn join_names(failures: &[(FeatureName, ParseError)]) -> String {
    failures
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn new(failures: Vec<(FeatureName, ParseError)>) -> Self {
        Self { failures }
    }

    /// Offending feature names in canonical order
    pub fn invalid_features(&self) -> Vec<FeatureName> {
        self.failures.iter().map(|(name, _)| *name).collect()
    }

    pub fn failures(&self) -> &[(FeatureName, ParseError)] {
        &self.failures
    }
}

/// Failure to obtain a label from a classifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("{target} model unavailable: {reason}")]
    ModelUnavailable { target: ModelTarget, reason: String },

    #[error("{target} model accepts only torque_values, record has [{}]", join_features(.found))]
    UnexpectedFeatures {
        target: ModelTarget,
        found: Vec<FeatureName>,
    },

    #[error("{target} model failed: {reason}")]
    Classifier { target: ModelTarget, reason: String },

    #[error("{target} model returned no prediction")]
    EmptyPrediction { target: ModelTarget },
}

fn join_features(found: &[FeatureName]) -> String {
    found
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl InferenceError {
    pub fn target(&self) -> ModelTarget {
        match self {
            InferenceError::ModelUnavailable { target, .. }
            | InferenceError::UnexpectedFeatures { target, .. }
            | InferenceError::Classifier { target, .. }
            | InferenceError::EmptyPrediction { target } => *target,
        }
    }
}

/// Outcome of a failed submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Text that does not name one of the enumerated choices
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}', expected one of: {expected}")]
pub struct ChoiceError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ChoiceError {
    pub fn new(kind: &'static str, value: impl Into<String>, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.into(),
            expected,
        }
    }
}
