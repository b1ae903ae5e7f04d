// tests/engine.rs
//
// End-to-end behaviour of MudraEngine through its public API.

use mudra_detection::analysis::{FeatureVector, MudraClassifier, Prediction, SharedClassifier};
use mudra_detection::pipeline::{Clock, HandTracker, ManualClock, TrackerFactory};
use mudra_detection::types::{NO_HAND_TEXT, STABILIZING_TEXT, UNKNOWN_TEXT};
use mudra_detection::{
    Config, EngineError, FsmState, HandObservation, Handedness, Landmark, LandmarkFrame, Method,
    MudraEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// HANDS
// ============================================================================

const MCPS: [(f32, f32); 4] = [(0.545, 0.605), (0.5, 0.6), (0.455, 0.605), (0.415, 0.615)];

/// Right hand with each finger either straight up or curled into the palm
fn hand(
    extended: [bool; 4],
    thumb_ip: (f32, f32),
    thumb_tip: (f32, f32),
    dx: f32,
) -> HandObservation {
    let mut pts = vec![(0.5, 0.8), (0.56, 0.76), (0.60, 0.71), thumb_ip, thumb_tip];
    for (i, &(x, y)) in MCPS.iter().enumerate() {
        pts.push((x, y));
        if extended[i] {
            pts.extend([(x, y - 0.07), (x, y - 0.11), (x, y - 0.14)]);
        } else {
            pts.extend([(x, y - 0.05), (x, y - 0.02), (x, y + 0.01)]);
        }
    }
    let points: Vec<Landmark> = pts
        .into_iter()
        .map(|(x, y)| Landmark::new(x + dx, y, 0.0))
        .collect();
    HandObservation::new(LandmarkFrame::from_slice(&points).unwrap(), Handedness::Right)
}

const ALONGSIDE: [(f32, f32); 2] = [(0.58, 0.66), (0.56, 0.63)];
const ACROSS: [(f32, f32); 2] = [(0.57, 0.62), (0.52, 0.58)];

fn pataka() -> HandObservation {
    hand([true; 4], ALONGSIDE[0], ALONGSIDE[1], 0.0)
}

fn mushti() -> HandObservation {
    hand([false; 4], ACROSS[0], ACROSS[1], 0.0)
}

/// Index and little finger up: no rule covers this pose
fn horns(dx: f32) -> HandObservation {
    hand([true, false, false, true], ACROSS[0], ACROSS[1], dx)
}

// ============================================================================
// COLLABORATORS
// ============================================================================

struct ScriptedClassifier {
    classes: Vec<String>,
    label: &'static str,
    confidence: f32,
    fail: bool,
}

impl MudraClassifier for ScriptedClassifier {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, _features: &FeatureVector) -> Result<Prediction, EngineError> {
        if self.fail {
            return Err(EngineError::Classifier("runtime unavailable".into()));
        }
        Ok(Prediction {
            label: self.label.to_string(),
            confidence: self.confidence,
        })
    }
}

fn classifier(label: &'static str, confidence: f32, fail: bool) -> SharedClassifier {
    Arc::new(ScriptedClassifier {
        classes: vec!["Chakra".to_string(), "Pataka".to_string()],
        label,
        confidence,
        fail,
    })
}

/// Sees a Pataka hand in any non-empty image; counts releases
struct CountingTracker {
    releases: Arc<AtomicUsize>,
}

impl HandTracker for CountingTracker {
    fn detect(&mut self, image: &[u8]) -> Result<Option<HandObservation>, EngineError> {
        Ok(if image.is_empty() { None } else { Some(pataka()) })
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    engine: MudraEngine,
    clock: Arc<ManualClock>,
    releases: Arc<AtomicUsize>,
}

fn harness(model: Option<SharedClassifier>) -> Harness {
    let clock = Arc::new(ManualClock::new());
    let releases = Arc::new(AtomicUsize::new(0));
    let counter = releases.clone();
    let factory: TrackerFactory = Arc::new(move || {
        Box::new(CountingTracker {
            releases: counter.clone(),
        }) as Box<dyn HandTracker>
    });
    let shared_clock: Arc<dyn Clock> = clock.clone();

    let mut builder = MudraEngine::builder(Config::default())
        .clock(shared_clock)
        .tracker_factory(factory);
    if let Some(model) = model {
        builder = builder.classifier(model);
    }
    Harness {
        engine: builder.build().unwrap(),
        clock,
        releases,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_sessions_are_isolated() {
    let h = harness(None);
    let e = &h.engine;

    e.process_frame(Some("alice"), Some(&pataka()));
    e.process_frame(Some("bob"), Some(&mushti()));
    let alice = e.process_frame(Some("alice"), Some(&pataka()));
    let bob = e.process_frame(Some("bob"), None);

    assert_eq!(alice.fsm_state, FsmState::Confirmed);
    assert_eq!(alice.mudra, "Pataka");
    assert_eq!(bob.fsm_state, FsmState::Detecting);
    assert_eq!(bob.mudra, NO_HAND_TEXT);

    let a = e.registry().get_or_create("alice");
    let b = e.registry().get_or_create("bob");
    assert!(a.lock().previous().is_some());
    assert!(b.lock().previous().is_none());
    assert_eq!(a.lock().debouncer().held_label(), Some("Pataka"));
    assert_eq!(b.lock().debouncer().held_label(), Some("Mushti"));
}

#[test]
fn test_idle_session_evicted_and_released_once() {
    let h = harness(None);
    let e = &h.engine;

    e.process_frame(Some("idle"), Some(&pataka()));
    h.clock.advance(Duration::from_secs(61));
    e.process_frame(Some("active"), None);

    assert!(!e.registry().contains("idle"));
    assert!(e.registry().contains("active"));
    assert_eq!(h.releases.load(Ordering::SeqCst), 1);
    assert_eq!(e.metrics().summary().sessions_evicted, 1);

    // Later traffic does not release it again
    e.process_frame(Some("active"), None);
    assert_eq!(e.registry().evict_idle(), 0);
    assert_eq!(h.releases.load(Ordering::SeqCst), 1);

    // Returning after the timeout starts from scratch
    let r = e.process_frame(Some("idle"), None);
    assert_eq!(r.fsm_state, FsmState::NoHand);
}

#[test]
fn test_reset_then_no_hand() {
    let h = harness(None);
    let e = &h.engine;

    e.process_frame(Some("s"), Some(&mushti()));
    let confirmed = e.process_frame(Some("s"), Some(&mushti()));
    assert_eq!(confirmed.mudra, "Mushti");

    assert_eq!(e.reset_session(Some("s")), FsmState::NoHand);
    assert_eq!(h.releases.load(Ordering::SeqCst), 1);

    let r = e.process_frame(Some("s"), None);
    assert_eq!(r.fsm_state, FsmState::NoHand);
    assert_eq!(r.display_text, NO_HAND_TEXT);
    assert_eq!(r.stable_label, None);
}

#[test]
fn test_rule_precedes_model() {
    let h = harness(Some(classifier("Chakra", 0.99, false)));
    let e = &h.engine;

    let r = e.process_frame(Some("s"), Some(&pataka()));
    assert_eq!(r.raw_detection, "Pataka");
    let r = e.process_frame(Some("s"), Some(&pataka()));
    assert_eq!(r.mudra, "Pataka");
    assert_eq!(r.method, Method::Rule);
    assert_eq!(r.confidence, 1.0);
    assert_eq!(e.metrics().summary().ml_hits, 0);
}

#[test]
fn test_model_fills_in_when_no_rule_matches() {
    let h = harness(Some(classifier("Chakra", 0.8, false)));
    let e = &h.engine;

    e.process_frame(Some("s"), Some(&horns(0.0)));
    let r = e.process_frame(Some("s"), Some(&horns(0.0)));
    assert_eq!(r.mudra, "Chakra");
    assert_eq!(r.method, Method::Ml);
    assert!((r.confidence - 0.8).abs() < 1e-6);
}

#[test]
fn test_moving_hand_is_stabilizing() {
    let h = harness(Some(classifier("Chakra", 0.99, false)));
    let e = &h.engine;

    let first = e.process_frame(Some("s"), Some(&horns(0.0)));
    assert_eq!(first.raw_detection, "Chakra");

    let moved = e.process_frame(Some("s"), Some(&horns(0.08)));
    assert_eq!(moved.raw_detection, STABILIZING_TEXT);
    assert_eq!(moved.mudra, UNKNOWN_TEXT);
    assert_eq!(moved.fsm_state, FsmState::Detecting);
    assert_eq!(e.metrics().summary().in_motion_frames, 1);
}

#[test]
fn test_classifier_failure_degrades_to_rules() {
    let h = harness(Some(classifier("Chakra", 0.99, true)));
    let e = &h.engine;

    let r = e.process_frame(Some("s"), Some(&horns(0.0)));
    assert_eq!(r.raw_detection, UNKNOWN_TEXT);
    assert_eq!(e.metrics().summary().classifier_errors, 1);

    e.process_frame(Some("s"), Some(&mushti()));
    let r = e.process_frame(Some("s"), Some(&mushti()));
    assert_eq!(r.mudra, "Mushti");
}

#[test]
fn test_catalog_merges_rule_and_model_classes() {
    let h = harness(Some(classifier("Chakra", 0.99, false)));
    let e = &h.engine;

    assert_eq!(e.ml_mudras(), vec!["Chakra".to_string(), "Pataka".to_string()]);
    let all = e.supported_mudras();
    assert_eq!(all.len(), 14);
    assert!(all.windows(2).all(|w| w[0] < w[1]));

    let health = e.health();
    assert!(health.model_loaded);
    assert_eq!(health.rule_mudras, 13);
    assert_eq!(health.ml_mudras, 2);
}

#[test]
fn test_image_path_uses_session_tracker() {
    let h = harness(None);
    let e = &h.engine;

    let r = e.process_image(Some("cam"), b"frame");
    assert!(r.hand_detected);
    assert_eq!(r.raw_detection, "Pataka");
    let r = e.process_image(Some("cam"), b"");
    assert!(!r.hand_detected);
    assert_eq!(h.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn test_concurrent_sessions() {
    let h = harness(None);
    let e = &h.engine;
    let ids: Vec<String> = (0..8).map(|i| format!("client-{}", i)).collect();

    std::thread::scope(|scope| {
        for (i, id) in ids.iter().enumerate() {
            scope.spawn(move || {
                let frame = if i % 2 == 0 { pataka() } else { mushti() };
                for _ in 0..50 {
                    e.process_frame(Some(id.as_str()), Some(&frame));
                }
            });
        }
    });

    assert_eq!(e.session_count(), ids.len());
    for (i, id) in ids.iter().enumerate() {
        let expected = if i % 2 == 0 { "Pataka" } else { "Mushti" };
        let frame = if i % 2 == 0 { pataka() } else { mushti() };
        let r = e.process_frame(Some(id.as_str()), Some(&frame));
        assert_eq!(r.fsm_state, FsmState::Confirmed);
        assert_eq!(r.mudra, expected);
    }
    assert_eq!(e.metrics().summary().total_frames, 8 * 51);
}
