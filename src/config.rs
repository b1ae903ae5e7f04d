// src/config.rs

use crate::error::EngineError;
use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::time::Duration;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.debounce.enter_threshold == 0 {
            return Err(EngineError::Config(
                "debounce.enter_threshold must be at least 1".into(),
            ));
        }
        if self.debounce.exit_threshold == 0 {
            return Err(EngineError::Config(
                "debounce.exit_threshold must be at least 1".into(),
            ));
        }
        let threshold = self.classifier.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EngineError::Config(format!(
                "classifier.confidence_threshold {} outside [0, 1]",
                threshold
            )));
        }
        if !(self.classifier.stability_bound > 0.0) {
            return Err(EngineError::Config(format!(
                "classifier.stability_bound {} must be positive",
                self.classifier.stability_bound
            )));
        }
        if self.classifier.model_path.is_some() && self.classifier.classes.is_empty() {
            return Err(EngineError::Config(
                "classifier.classes is required when a model is configured".into(),
            ));
        }
        if self.session.idle_timeout_secs == 0 {
            return Err(EngineError::Config(
                "session.idle_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session.idle_timeout_secs)
    }
}
