//! Input normalization and feature assembly pipeline

mod assembly;
mod parser;
mod record;
mod router;
mod service;

pub use assembly::{assemble, FeatureSelection, RawInputs};
pub use parser::parse_series;
pub use record::FeatureRecord;
pub use router::ModelRouter;
pub use service::{InferenceService, Prediction};
