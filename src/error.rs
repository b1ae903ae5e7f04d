// src/error.rs
//
// Failures inside the engine. None of them are fatal: the pipeline turns
// input and classifier errors into an undecided frame and keeps going.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid landmark frame: {0}")]
    InvalidFrame(String),

    #[error("Degenerate scale reference: {0}")]
    DegenerateScale(f32),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Hand tracker error: {0}")]
    Tracker(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Malformed or degenerate input, recovered as "no candidate"
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidFrame(_) | EngineError::DegenerateScale(_)
        )
    }
}
