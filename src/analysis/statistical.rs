// src/analysis/statistical.rs
//
// Adapter around an external probability-producing classifier. The model
// itself is opaque; this layer owns the two acceptance gates.

use super::features::{extract_features, FeatureVector};
use crate::error::EngineError;
use crate::types::{Candidate, ClassifierConfig, HandObservation, LandmarkFrame, UndecidedReason};
use std::sync::Arc;
use tracing::{debug, warn};

/// Top-1 output of a statistical classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// External classifier over a closed set of classes
pub trait MudraClassifier: Send + Sync {
    fn classes(&self) -> &[String];
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, EngineError>;
}

pub type SharedClassifier = Arc<dyn MudraClassifier>;

pub struct StatisticalAdapter {
    classifier: Option<SharedClassifier>,
    confidence_threshold: f32,
    stability_bound: f32,
}

impl StatisticalAdapter {
    pub fn new(classifier: Option<SharedClassifier>, config: &ClassifierConfig) -> Self {
        Self {
            classifier,
            confidence_threshold: config.confidence_threshold,
            stability_bound: config.stability_bound,
        }
    }

    /// Adapter with no model: every frame falls through as `NoMatch`
    pub fn disabled(config: &ClassifierConfig) -> Self {
        Self::new(None, config)
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classes(&self) -> Vec<String> {
        self.classifier
            .as_ref()
            .map(|c| c.classes().to_vec())
            .unwrap_or_default()
    }

    /// Motion gate. Fails open when there is no previous frame.
    pub fn is_stable(&self, current: &LandmarkFrame, previous: Option<&LandmarkFrame>) -> bool {
        match previous {
            Some(prev) => current.max_displacement(prev) <= self.stability_bound,
            None => true,
        }
    }

    /// ML candidate for this frame, or the reason there is none
    pub fn evaluate(
        &self,
        hand: &HandObservation,
        previous: Option<&LandmarkFrame>,
    ) -> Result<Candidate, UndecidedReason> {
        let classifier = self.classifier.as_ref().ok_or(UndecidedReason::NoMatch)?;

        if !self.is_stable(&hand.landmarks, previous) {
            debug!("ML suppressed: hand in motion");
            return Err(UndecidedReason::InMotion);
        }

        let features = extract_features(hand).map_err(|e| {
            debug!("ML skipped: {}", e);
            UndecidedReason::InvalidFrame
        })?;

        let prediction = classifier
            .predict(&features)
            .and_then(validate_prediction)
            .map_err(|e| {
                warn!("⚠️  Statistical classifier failed, rule-only for this frame: {}", e);
                UndecidedReason::ClassifierUnavailable
            })?;

        if prediction.confidence < self.confidence_threshold {
            debug!(
                "ML rejected: {} at {:.3} < {:.2}",
                prediction.label, prediction.confidence, self.confidence_threshold
            );
            return Err(UndecidedReason::LowConfidence);
        }

        Ok(Candidate::ml(prediction.label, prediction.confidence))
    }
}

/// Top-1 class from a raw score vector. Scores that are not already a
/// probability distribution are passed through softmax first.
pub fn top_prediction(scores: &[f32], classes: &[String]) -> Result<Prediction, EngineError> {
    if scores.len() != classes.len() {
        return Err(EngineError::Classifier(format!(
            "model returned {} scores for {} classes",
            scores.len(),
            classes.len()
        )));
    }
    if scores.is_empty() || scores.iter().any(|s| !s.is_finite()) {
        return Err(EngineError::Classifier("empty or non-finite scores".into()));
    }

    let sum: f32 = scores.iter().sum();
    let is_distribution =
        scores.iter().all(|s| (0.0..=1.0).contains(s)) && (sum - 1.0).abs() < 1e-3;
    let probs: Vec<f32> = if is_distribution {
        scores.to_vec()
    } else {
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    };

    let (best, confidence) = probs
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
            if p > best.1 {
                (i, p)
            } else {
                best
            }
        });

    Ok(Prediction {
        label: classes[best].clone(),
        confidence,
    })
}

fn validate_prediction(prediction: Prediction) -> Result<Prediction, EngineError> {
    if !prediction.confidence.is_finite() || !(0.0..=1.0).contains(&prediction.confidence) {
        return Err(EngineError::Classifier(format!(
            "confidence {} outside [0, 1]",
            prediction.confidence
        )));
    }
    if prediction.label.is_empty() {
        return Err(EngineError::Classifier("empty label".into()));
    }
    Ok(prediction)
}
