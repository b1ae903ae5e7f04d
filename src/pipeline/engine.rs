// src/pipeline/engine.rs
//
// MudraEngine: the per-frame entry point for the request layer.
// Owns the shared rule bank and classifier, and the session registry that
// holds every client's debouncer and previous frame.

use super::clock::{Clock, SystemClock};
use super::metrics::{EngineMetrics, MetricsSummary};
use super::session::{null_tracker_factory, Session, SessionRegistry, TrackerFactory};
use crate::analysis::{HybridArbiter, RuleBank, SharedClassifier, StatisticalAdapter};
use crate::error::EngineError;
use crate::types::{
    Config, Decision, DisplayState, FrameResult, FsmState, HandObservation, Handedness, Landmark,
    LandmarkFrame, Method, UndecidedReason, NO_HAND_TEXT, UNKNOWN_TEXT,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the request layer handed us for one frame
#[derive(Clone, Copy)]
enum FrameInput<'a> {
    Absent,
    Present(&'a HandObservation),
    Malformed,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    pub rule_mudras: usize,
    pub ml_mudras: usize,
    pub total_mudras: usize,
    pub active_sessions: usize,
    pub metrics: MetricsSummary,
}

pub struct EngineBuilder {
    config: Config,
    classifier: Option<SharedClassifier>,
    rules: RuleBank,
    clock: Arc<dyn Clock>,
    tracker_factory: TrackerFactory,
}

impl EngineBuilder {
    pub fn classifier(mut self, classifier: SharedClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn rules(mut self, rules: RuleBank) -> Self {
        self.rules = rules;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn tracker_factory(mut self, factory: TrackerFactory) -> Self {
        self.tracker_factory = factory;
        self
    }

    pub fn build(self) -> Result<MudraEngine, EngineError> {
        self.config.validate()?;

        let metrics = EngineMetrics::new();
        let statistical = StatisticalAdapter::new(self.classifier, &self.config.classifier);
        let registry = SessionRegistry::new(
            self.config.debounce.clone(),
            self.config.idle_timeout(),
            self.clock,
            self.tracker_factory,
            metrics.clone(),
        );

        info!(
            "✓ Mudra engine ready: {} rules, {} ML classes (enter={}, exit={}, mismatch={})",
            self.rules.len(),
            statistical.classes().len(),
            self.config.debounce.enter_threshold,
            self.config.debounce.exit_threshold,
            self.config.debounce.max_mismatch
        );

        Ok(MudraEngine {
            default_id: self.config.session.default_id.clone(),
            arbiter: HybridArbiter::new(self.rules, statistical),
            registry,
            metrics,
        })
    }
}

pub struct MudraEngine {
    default_id: String,
    arbiter: HybridArbiter,
    registry: SessionRegistry,
    metrics: EngineMetrics,
}

impl MudraEngine {
    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder {
            config,
            classifier: None,
            rules: RuleBank::standard(),
            clock: Arc::new(SystemClock),
            tracker_factory: null_tracker_factory(),
        }
    }

    /// Rule-only engine on the system clock
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::builder(config).build()
    }

    // ========================================================================
    // FRAME PROCESSING
    // ========================================================================

    /// One frame for one session. `None` hand means the detector saw no hand.
    pub fn process_frame(
        &self,
        session_id: Option<&str>,
        hand: Option<&HandObservation>,
    ) -> FrameResult {
        let input = hand.map_or(FrameInput::Absent, FrameInput::Present);
        self.run(session_id, input, false)
    }

    /// As `process_frame`, echoing the submitted landmarks in the result
    pub fn process_frame_with_landmarks(
        &self,
        session_id: Option<&str>,
        hand: Option<&HandObservation>,
    ) -> FrameResult {
        let input = hand.map_or(FrameInput::Absent, FrameInput::Present);
        self.run(session_id, input, true)
    }

    /// Unvalidated points straight from the wire. A malformed frame is
    /// reported as an undecided hand frame, never as a failure.
    pub fn process_landmarks(
        &self,
        session_id: Option<&str>,
        points: &[Landmark],
        handedness: Handedness,
        include_landmarks: bool,
    ) -> FrameResult {
        match LandmarkFrame::from_slice(points) {
            Ok(frame) => {
                let hand = HandObservation::new(frame, handedness);
                self.run(session_id, FrameInput::Present(&hand), include_landmarks)
            }
            Err(e) => {
                warn!("⚠️  Dropping malformed frame: {}", e);
                self.run(session_id, FrameInput::Malformed, include_landmarks)
            }
        }
    }

    /// Run the session's own hand tracker on an image, then classify.
    /// A tracker failure counts as "no hand" for this frame.
    pub fn process_image(&self, session_id: Option<&str>, image: &[u8]) -> FrameResult {
        let id = self.resolve(session_id);
        self.with_session(id, |session| {
            let detected = match session.detect(image) {
                Ok(hand) => hand,
                Err(e) => {
                    warn!("⚠️  Hand tracker failed for session {}: {}", id, e);
                    self.metrics.inc(&self.metrics.tracker_failures);
                    None
                }
            };
            let input = detected
                .as_ref()
                .map_or(FrameInput::Absent, FrameInput::Present);
            self.step(session, input, false)
        })
    }

    /// Discard the session's state and start over in NO_HAND
    pub fn reset_session(&self, session_id: Option<&str>) -> FsmState {
        let id = self.resolve(session_id);
        let handle = self.registry.reset(id);
        let state = handle.lock().debouncer().state();
        state
    }

    fn resolve<'a>(&'a self, session_id: Option<&'a str>) -> &'a str {
        session_id.unwrap_or(&self.default_id)
    }

    fn run(
        &self,
        session_id: Option<&str>,
        input: FrameInput<'_>,
        include_landmarks: bool,
    ) -> FrameResult {
        let id = self.resolve(session_id);
        self.with_session(id, |session| self.step(session, input, include_landmarks))
    }

    /// Lock the live session for `id`. A handle released by a concurrent
    /// reset or eviction before we got the lock is looked up again.
    fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        loop {
            let handle = self.registry.get_or_create(id);
            let mut session = handle.lock();
            if !session.is_closed() {
                return f(&mut *session);
            }
            debug!("Session {} was replaced while waiting, retrying", id);
        }
    }

    fn step(
        &self,
        session: &mut Session,
        input: FrameInput<'_>,
        include_landmarks: bool,
    ) -> FrameResult {
        self.metrics.inc(&self.metrics.total_frames);

        let decision = match input {
            FrameInput::Absent => Decision::NoHand,
            FrameInput::Malformed => Decision::Undecided(UndecidedReason::InvalidFrame),
            FrameInput::Present(hand) => self.arbiter.decide(Some(hand), session.previous()),
        };
        self.record(&decision);

        let was_confirmed = session.debouncer.state() == FsmState::Confirmed;
        let shown = session
            .debouncer
            .update(decision.hand_present(), decision.candidate());
        let fsm_state = session.debouncer.state();
        if fsm_state == FsmState::Confirmed && !was_confirmed {
            self.metrics.inc(&self.metrics.confirmations);
        }

        let landmarks = match input {
            FrameInput::Present(hand) if include_landmarks => Some(hand.landmarks.to_triples()),
            _ => None,
        };
        session.previous = match input {
            FrameInput::Present(hand) => Some(hand.landmarks.clone()),
            _ => None,
        };

        debug!(
            "Session {}: raw={} → {} [{}]",
            session.id(),
            decision.raw_label(),
            shown.text(),
            fsm_state.as_str()
        );

        build_result(session.id(), &decision, &shown, fsm_state, landmarks)
    }

    fn record(&self, decision: &Decision) {
        let m = &self.metrics;
        match decision {
            Decision::NoHand => {}
            Decision::Matched(c) => {
                m.inc(&m.hand_frames);
                match c.method {
                    Method::Rule => m.inc(&m.rule_hits),
                    Method::Ml => m.inc(&m.ml_hits),
                    Method::None => {}
                }
            }
            Decision::Undecided(reason) => {
                m.inc(&m.hand_frames);
                m.inc(&m.undecided_frames);
                match reason {
                    UndecidedReason::InvalidFrame => m.inc(&m.invalid_frames),
                    UndecidedReason::InMotion => m.inc(&m.in_motion_frames),
                    UndecidedReason::ClassifierUnavailable => m.inc(&m.classifier_errors),
                    UndecidedReason::LowConfidence | UndecidedReason::NoMatch => {}
                }
            }
        }
    }

    // ========================================================================
    // CATALOG / HEALTH
    // ========================================================================

    /// Rule names in priority order
    pub fn rule_mudras(&self) -> Vec<String> {
        self.arbiter
            .rules()
            .names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn ml_mudras(&self) -> Vec<String> {
        self.arbiter.statistical().classes()
    }

    /// Sorted union of rule and statistical classes
    pub fn supported_mudras(&self) -> Vec<String> {
        let mut all = self.rule_mudras();
        all.extend(self.ml_mudras());
        all.sort();
        all.dedup();
        all
    }

    pub fn default_session_id(&self) -> &str {
        &self.default_id
    }

    pub fn model_loaded(&self) -> bool {
        self.arbiter.statistical().is_loaded()
    }

    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn health(&self) -> HealthReport {
        let rule_mudras = self.rule_mudras().len();
        let ml_mudras = self.ml_mudras().len();
        HealthReport {
            status: "ok",
            model_loaded: self.model_loaded(),
            rule_mudras,
            ml_mudras,
            total_mudras: self.supported_mudras().len(),
            active_sessions: self.session_count(),
            metrics: self.metrics.summary(),
        }
    }
}

fn build_result(
    session_id: &str,
    decision: &Decision,
    display: &DisplayState,
    fsm_state: FsmState,
    landmarks: Option<Vec<[f32; 3]>>,
) -> FrameResult {
    let hand_detected = decision.hand_present();
    let (mudra, confidence, method) = match (hand_detected, display.label()) {
        (false, _) => (NO_HAND_TEXT.to_string(), 0.0, Method::None),
        (true, Some(label)) => (label.to_string(), display.confidence(), display.method()),
        (true, None) => (UNKNOWN_TEXT.to_string(), 0.0, Method::None),
    };

    FrameResult {
        session_id: session_id.to_string(),
        hand_detected,
        mudra,
        stable_label: display.label().map(String::from),
        display_text: display.text().to_string(),
        confidence,
        method,
        fsm_state,
        raw_detection: decision.raw_label(),
        landmarks,
    }
}
