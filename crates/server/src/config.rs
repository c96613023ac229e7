//! Server configuration

use anyhow::{Context, Result};
use screw_lib::inference::{ArtifactConfig, FileModelLoader, DEFAULT_LABELS};
use screw_lib::models::Label;
use serde::Deserialize;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the prediction, health and metrics API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Torque-only classifier artifact
    #[serde(default = "default_torque_model_path")]
    pub torque_model_path: String,

    /// Multi-feature classifier artifact
    #[serde(default = "default_multi_model_path")]
    pub multi_model_path: String,

    #[serde(default)]
    pub torque_model_sha256: Option<String>,

    #[serde(default)]
    pub multi_model_sha256: Option<String>,

    /// Class index to label table shared by both classifiers
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,

    /// Load both classifiers at startup instead of on first request
    #[serde(default = "default_preload_models")]
    pub preload_models: bool,

    /// Instance name attached to structured log records
    #[serde(default = "default_instance")]
    pub instance: String,
}

fn default_api_port() -> u16 {
    8080
}

fn default_torque_model_path() -> String {
    "models/Torque_Single_WorkpieceResult.onnx".to_string()
}

fn default_multi_model_path() -> String {
    "models/TorqueAngleGradientStep_Multi_WorkpieceResult.onnx".to_string()
}

fn default_labels() -> Vec<String> {
    DEFAULT_LABELS.iter().map(|l| l.to_string()).collect()
}

fn default_preload_models() -> bool {
    true
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "screw-server".to_string())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            torque_model_path: default_torque_model_path(),
            multi_model_path: default_multi_model_path(),
            torque_model_sha256: None,
            multi_model_sha256: None,
            labels: default_labels(),
            preload_models: default_preload_models(),
            instance: default_instance(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `screw-server` file, then the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("screw-server").required(false))
            .add_source(
                config::Environment::with_prefix("SCREW")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("labels"),
            )
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }

    /// Artifact loader for both classifiers
    pub fn to_loader(&self) -> FileModelLoader {
        let mut torque = ArtifactConfig::new(&self.torque_model_path);
        if let Some(sha) = &self.torque_model_sha256 {
            torque = torque.with_sha256(sha);
        }

        let mut multi = ArtifactConfig::new(&self.multi_model_path);
        if let Some(sha) = &self.multi_model_sha256 {
            multi = multi.with_sha256(sha);
        }

        FileModelLoader::new(torque, multi)
            .with_labels(self.labels.iter().map(|l| Label::new(l.as_str())).collect())
    }
}
