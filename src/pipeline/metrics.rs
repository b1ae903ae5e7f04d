// src/pipeline/metrics.rs
//
// Engine observability. Lock-free counters shared by every session;
// summarized for health checks and the end-of-replay log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub hand_frames: Arc<AtomicU64>,
    pub invalid_frames: Arc<AtomicU64>,
    pub rule_hits: Arc<AtomicU64>,
    pub ml_hits: Arc<AtomicU64>,
    pub undecided_frames: Arc<AtomicU64>,
    pub in_motion_frames: Arc<AtomicU64>,
    pub classifier_errors: Arc<AtomicU64>,
    pub tracker_failures: Arc<AtomicU64>,
    pub confirmations: Arc<AtomicU64>,
    pub sessions_created: Arc<AtomicU64>,
    pub sessions_evicted: Arc<AtomicU64>,
    pub sessions_reset: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            hand_frames: Arc::new(AtomicU64::new(0)),
            invalid_frames: Arc::new(AtomicU64::new(0)),
            rule_hits: Arc::new(AtomicU64::new(0)),
            ml_hits: Arc::new(AtomicU64::new(0)),
            undecided_frames: Arc::new(AtomicU64::new(0)),
            in_motion_frames: Arc::new(AtomicU64::new(0)),
            classifier_errors: Arc::new(AtomicU64::new(0)),
            tracker_failures: Arc::new(AtomicU64::new(0)),
            confirmations: Arc::new(AtomicU64::new(0)),
            sessions_created: Arc::new(AtomicU64::new(0)),
            sessions_evicted: Arc::new(AtomicU64::new(0)),
            sessions_reset: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            hand_frames: self.hand_frames.load(Ordering::Relaxed),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            rule_hits: self.rule_hits.load(Ordering::Relaxed),
            ml_hits: self.ml_hits.load(Ordering::Relaxed),
            undecided_frames: self.undecided_frames.load(Ordering::Relaxed),
            in_motion_frames: self.in_motion_frames.load(Ordering::Relaxed),
            classifier_errors: self.classifier_errors.load(Ordering::Relaxed),
            tracker_failures: self.tracker_failures.load(Ordering::Relaxed),
            confirmations: self.confirmations.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            sessions_reset: self.sessions_reset.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub hand_frames: u64,
    pub invalid_frames: u64,
    pub rule_hits: u64,
    pub ml_hits: u64,
    pub undecided_frames: u64,
    pub in_motion_frames: u64,
    pub classifier_errors: u64,
    pub tracker_failures: u64,
    pub confirmations: u64,
    pub sessions_created: u64,
    pub sessions_evicted: u64,
    pub sessions_reset: u64,
    pub elapsed_secs: f64,
}
