// src/analysis/mod.rs
//
// Per-frame mudra classification and temporal debouncing.
//
// Signal flow:
//   LandmarkFrame → rules ────────────────────────┐
//                 → features → statistical ───────┼→ arbiter → Decision → debouncer → DisplayState
//   previous LandmarkFrame (stability gate) ──────┘
//
// Driven per session by pipeline::MudraEngine.

pub mod arbiter;
pub mod debouncer;
pub mod features;
pub mod geometry;
pub mod rules;
pub mod statistical;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for ergonomic access from the pipeline
pub use arbiter::HybridArbiter;
pub use debouncer::TemporalDebouncer;
pub use features::{extract_features, FeatureVector, FEATURE_COUNT};
pub use rules::{MudraRule, RuleBank};
pub use statistical::{MudraClassifier, Prediction, SharedClassifier, StatisticalAdapter};
