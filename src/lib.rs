// src/lib.rs
//
// Hybrid mudra classification with per-session temporal debouncing.

pub mod analysis;
pub mod config;
pub mod error;
#[cfg(feature = "onnx")]
pub mod inference;
pub mod pipeline;
pub mod replay;
pub mod types;

pub use error::EngineError;
pub use pipeline::{MudraEngine, SessionRegistry};
pub use types::{
    Candidate, Config, Decision, FrameResult, FsmState, HandObservation, Handedness, Landmark,
    LandmarkFrame, Method,
};
