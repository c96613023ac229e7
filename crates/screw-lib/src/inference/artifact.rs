//! Model artifacts on disk
//!
//! Reads the exported classifier graphs, validates their checksum when one
//! is pinned, and hands the bytes to the ONNX classifier.

use super::{Classifier, ModelLoader, OnnxClassifier};
use crate::models::{Label, ModelTarget};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Class index to label table used when none is configured
pub const DEFAULT_LABELS: [&str; 2] = ["OK", "NOK"];

/// Where one model lives and what its bytes must hash to
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub path: PathBuf,
    /// Lowercase hex SHA256 of the file, checked when set
    pub sha256: Option<String>,
}

impl ArtifactConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sha256: None,
        }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}

/// Loads both classifiers from ONNX files
#[derive(Debug, Clone)]
pub struct FileModelLoader {
    torque_only: ArtifactConfig,
    multi_feature: ArtifactConfig,
    labels: Vec<Label>,
}

impl FileModelLoader {
    pub fn new(torque_only: ArtifactConfig, multi_feature: ArtifactConfig) -> Self {
        Self {
            torque_only,
            multi_feature,
            labels: DEFAULT_LABELS.iter().map(|l| Label::from(*l)).collect(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<Label>) -> Self {
        self.labels = labels;
        self
    }

    pub fn artifact(&self, target: ModelTarget) -> &ArtifactConfig {
        match target {
            ModelTarget::TorqueOnly => &self.torque_only,
            ModelTarget::MultiFeature => &self.multi_feature,
        }
    }

    /// Read artifact bytes and verify the pinned checksum
    pub fn read_artifact(&self, target: ModelTarget) -> Result<(Vec<u8>, String)> {
        let artifact = self.artifact(target);
        let bytes = std::fs::read(&artifact.path)
            .with_context(|| format!("Failed to read {} model from {:?}", target, artifact.path))?;

        let checksum = compute_checksum(&bytes);
        if let Some(expected) = &artifact.sha256 {
            if !expected.eq_ignore_ascii_case(&checksum) {
                anyhow::bail!(
                    "Checksum mismatch for {} model: expected {}, got {}",
                    target,
                    expected,
                    checksum
                );
            }
        }

        debug!(
            model_target = %target,
            size = bytes.len(),
            checksum = %checksum,
            "Model artifact read"
        );
        Ok((bytes, checksum))
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self, target: ModelTarget) -> Result<Arc<dyn Classifier>> {
        let (bytes, checksum) = self.read_artifact(target)?;
        let classifier = OnnxClassifier::from_bytes(target, &bytes, self.labels.clone(), checksum)
            .with_context(|| format!("Failed to load {} model", target))?;
        Ok(Arc::new(classifier))
    }
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
