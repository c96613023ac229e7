//! ONNX classifier inference using tract
//!
//! Graph inputs are matched to record features by node name. Series are
//! fed as `f32[1, n]` value tensors and metadata as `i64[1, 1]` category
//! codes. Because series length varies per request, the graph is kept in
//! its unoptimized form and concretized for every call.

use super::Classifier;
use crate::models::{FeatureName, FeatureValue, Label, ModelTarget};
use crate::pipeline::FeatureRecord;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE_MS: u128 = 50;

/// Single-column scores at or above this pick label index 1
const POSITIVE_THRESHOLD: f32 = 0.5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// tract-backed classifier loaded from an ONNX graph
pub struct OnnxClassifier {
    target: ModelTarget,
    model: InferenceModel,
    inputs: Vec<(usize, FeatureName)>,
    labels: Vec<Label>,
    checksum: String,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .field("labels", &self.labels)
            .field("checksum", &self.checksum)
            .finish()
    }
}

impl OnnxClassifier {
    /// Parse an ONNX graph and bind its inputs to feature names
    pub fn from_bytes(
        target: ModelTarget,
        model_bytes: &[u8],
        labels: Vec<Label>,
        checksum: String,
    ) -> Result<Self> {
        if labels.is_empty() {
            anyhow::bail!("Label table for {} model is empty", target);
        }

        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?;

        let inputs = model
            .input_outlets()
            .context("Failed to read model inputs")?
            .iter()
            .enumerate()
            .map(|(ix, outlet)| {
                let name = &model.node(outlet.node).name;
                name.parse::<FeatureName>()
                    .map(|feature| (ix, feature))
                    .with_context(|| format!("Model input '{}' is not a known feature", name))
            })
            .collect::<Result<Vec<_>>>()?;

        if target == ModelTarget::TorqueOnly
            && inputs.iter().any(|(_, f)| *f != FeatureName::TorqueValues)
        {
            anyhow::bail!("Torque-only model may only take torque_values as input");
        }

        Ok(Self {
            target,
            model,
            inputs,
            labels,
            checksum,
        })
    }

    /// Features the graph consumes, in graph input order
    pub fn input_features(&self) -> Vec<FeatureName> {
        self.inputs.iter().map(|(_, f)| *f).collect()
    }

    /// Tensor and matching input fact for one record entry
    fn feature_input(value: &FeatureValue) -> Result<(Tensor, InferenceFact)> {
        let input: (Tensor, InferenceFact) = match value {
            FeatureValue::Series(series) => {
                let data: Vec<f32> = series.values().iter().map(|v| *v as f32).collect();
                let shape = [1, data.len()];
                (Tensor::from_shape(&shape, &data)?, f32::fact(shape).into())
            }
            FeatureValue::Scalar(scalar) => {
                let shape = [1, 1];
                (Tensor::from_shape(&shape, &[scalar.code()])?, i64::fact(shape).into())
            }
        };
        Ok(input)
    }

    /// Concretize input shapes for this record and build a runnable plan
    fn plan_for(&self, record: &FeatureRecord) -> Result<(TractModel, TVec<TValue>)> {
        let mut model = self.model.clone();
        let mut tensors: TVec<TValue> = tvec!();

        for (ix, feature) in &self.inputs {
            let value = record
                .get(*feature)
                .with_context(|| format!("Record has no '{}' required by the model", feature))?;
            let (tensor, fact) = Self::feature_input(value)?;
            model = model
                .with_input_fact(*ix, fact)
                .with_context(|| format!("Failed to set input shape for '{}'", feature))?;
            tensors.push(tensor.into());
        }

        let plan = model
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok((plan, tensors))
    }

    /// Map output 0 to labels: integer tensors are class indices, float
    /// tensors are per-class scores reduced by argmax over the last axis.
    /// A single score column is the positive class probability.
    fn decode(&self, output: &Tensor) -> Result<Vec<Label>> {
        let indices: Vec<i64> = if output.datum_type().is_integer() {
            let cast = output.cast_to::<i64>()?;
            cast.as_slice::<i64>()?.to_vec()
        } else {
            let cast = output.cast_to::<f32>()?;
            let scores = cast.as_slice::<f32>()?;
            let classes = output.shape().last().copied().unwrap_or(1);
            if classes == 0 {
                anyhow::bail!("Model output has no classes");
            }
            if classes == 1 {
                return scores
                    .iter()
                    .map(|score| self.label_at(i64::from(*score >= POSITIVE_THRESHOLD)))
                    .collect();
            }
            scores
                .chunks(classes)
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                        .map(|(i, _)| i as i64)
                        .unwrap_or(0)
                })
                .collect()
        };

        indices.into_iter().map(|ix| self.label_at(ix)).collect()
    }

    fn label_at(&self, ix: i64) -> Result<Label> {
        usize::try_from(ix)
            .ok()
            .and_then(|ix| self.labels.get(ix))
            .cloned()
            .with_context(|| {
                format!(
                    "Class index {} outside label table of {}",
                    ix,
                    self.labels.len()
                )
            })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, record: &FeatureRecord) -> Result<Vec<Label>> {
        let start = Instant::now();

        let (plan, inputs) = self.plan_for(record)?;
        let outputs = plan.run(inputs).context("Model execution failed")?;
        let output = outputs.first().context("No output from model")?;
        let labels = self.decode(output)?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(
                model_target = %self.target,
                elapsed_ms = elapsed.as_millis() as u64,
                "Inference exceeded {}ms", SLOW_INFERENCE_MS
            );
        } else {
            debug!(model_target = %self.target, elapsed_us = elapsed.as_micros() as u64, "Inference completed");
        }

        Ok(labels)
    }

    fn describe(&self) -> String {
        let inputs = self
            .input_features()
            .iter()
            .map(FeatureName::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "onnx:{}:{}:[{}]",
            self.target,
            &self.checksum[..self.checksum.len().min(12)],
            inputs
        )
    }
}
