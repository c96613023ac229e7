//! Inference gateway: the two pre-trained classifiers
//!
//! Classifiers are opaque to the rest of the pipeline. They are loaded on
//! first use through a [`ModelLoader`] and shared read-only afterwards.

mod artifact;
mod onnx;
mod registry;

pub use artifact::{compute_checksum, ArtifactConfig, FileModelLoader, DEFAULT_LABELS};
pub use onnx::OnnxClassifier;
pub use registry::{ModelRegistry, ModelStatus};

use crate::models::{Label, ModelTarget};
use crate::pipeline::FeatureRecord;
use anyhow::Result;
use std::sync::Arc;

/// Trait for classifier implementations
pub trait Classifier: Send + Sync {
    /// Predict one label per input row; callers use the first
    fn predict(&self, record: &FeatureRecord) -> Result<Vec<Label>>;

    /// Human readable identifier for logs
    fn describe(&self) -> String;
}

/// Produces a classifier for a target, typically by reading an artifact
pub trait ModelLoader: Send + Sync {
    fn load(&self, target: ModelTarget) -> Result<Arc<dyn Classifier>>;
}
