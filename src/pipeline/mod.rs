// src/pipeline/mod.rs

pub mod clock;
pub mod engine;
pub mod metrics;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineBuilder, HealthReport, MudraEngine};
pub use metrics::{EngineMetrics, MetricsSummary};
pub use session::{
    null_tracker_factory, HandTracker, NullTracker, Session, SessionHandle, SessionRegistry,
    TrackerFactory,
};
