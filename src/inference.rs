// src/inference.rs
//
// ONNX Runtime backend for the statistical classifier.

use crate::analysis::statistical::top_prediction;
use crate::analysis::{FeatureVector, MudraClassifier, Prediction, FEATURE_COUNT};
use crate::error::EngineError;
use crate::types::ClassifierConfig;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use parking_lot::Mutex;
use tracing::{debug, info};

pub struct OnnxClassifier {
    session: Mutex<Session>,
    classes: Vec<String>,
    input_name: String,
}

impl OnnxClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let path = config
            .model_path
            .as_deref()
            .context("classifier.model_path is not set")?;
        info!("Initializing mudra classifier");
        info!("Model path: {}", path);

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .with_inter_threads(1)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model {}", path))?;

        info!(
            "✓ Mudra classifier initialized ({} classes)",
            config.classes.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            classes: config.classes.clone(),
            input_name: config.input_name.clone(),
        })
    }

    fn scores(&self, features: &FeatureVector) -> Result<Vec<f32>> {
        let shape = [1usize, FEATURE_COUNT];
        let input_value = ort::value::Value::from_array((
            shape.as_slice(),
            features.as_slice().to_vec().into_boxed_slice(),
        ))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let output = &outputs[0];
        let (output_shape, data_slice) = output.try_extract_tensor::<f32>()?;
        debug!("Classifier output shape: {:?}", output_shape);

        Ok(data_slice.to_vec())
    }
}

impl MudraClassifier for OnnxClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> std::result::Result<Prediction, EngineError> {
        let scores = self
            .scores(features)
            .map_err(|e| EngineError::Classifier(e.to_string()))?;
        top_prediction(&scores, &self.classes)
    }
}
