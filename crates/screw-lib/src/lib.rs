//! Screw tightening quality classification library
//!
//! This crate provides the core functionality for:
//! - Parsing comma-separated sensor series
//! - Assembling and validating feature records
//! - Routing records to the torque-only or multi-feature classifier
//! - The interactive session state machine
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod inference;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod requests;
pub mod session;

pub use error::{ChoiceError, InferenceError, ParseError, PredictError, ValidationError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ClassifierMetrics, StructuredLogger};
pub use pipeline::{FeatureRecord, FeatureSelection, InferenceService, Prediction, RawInputs};
pub use requests::{CustomRequest, ErrorResponse, MetadataInput, PredictionResponse, TorqueRequest};
pub use session::{Mode, Session, SessionError, Submission};
