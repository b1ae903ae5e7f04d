// src/analysis/debouncer.rs
//
// Per-session temporal debouncer.
//
//   NO_HAND ──hand──▶ DETECTING ──enter_threshold matches──▶ CONFIRMED
//      ▲                  │  ▲                                   │
//      └── no-hand > tol ─┘  └──── dissent > max_mismatch ───────┤
//      ▲                                                         │
//      └────────────── exit_threshold no-hand frames ────────────┘
//
// A label is only ever shown from CONFIRMED. Isolated dissenting frames
// are absorbed; sustained dissent restarts accumulation.

use crate::types::{Candidate, DebounceConfig, DisplayState, FsmState, Method};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TemporalDebouncer {
    config: DebounceConfig,
    state: FsmState,
    held_label: Option<String>,
    match_count: u32,
    mismatch_count: u32,
    last_confidence: f32,
    last_method: Method,
}

impl TemporalDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: FsmState::NoHand,
            held_label: None,
            match_count: 0,
            mismatch_count: 0,
            last_confidence: 0.0,
            last_method: Method::None,
        }
    }

    pub fn state(&self) -> FsmState {
        self.state
    }

    pub fn held_label(&self) -> Option<&str> {
        self.held_label.as_deref()
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn mismatch_count(&self) -> u32 {
        self.mismatch_count
    }

    /// Back to NO_HAND with nothing held
    pub fn reset(&mut self) {
        self.state = FsmState::NoHand;
        self.held_label = None;
        self.match_count = 0;
        self.mismatch_count = 0;
        self.last_confidence = 0.0;
        self.last_method = Method::None;
    }

    /// Feed one frame. `candidate` is ignored when no hand is present.
    pub fn update(&mut self, hand_present: bool, candidate: Option<&Candidate>) -> DisplayState {
        let candidate = if hand_present { candidate } else { None };

        match self.state {
            FsmState::NoHand => {
                if hand_present {
                    self.state = FsmState::Detecting;
                    self.restart(candidate);
                }
            }
            FsmState::Detecting => self.update_detecting(hand_present, candidate),
            FsmState::Confirmed => self.update_confirmed(hand_present, candidate),
        }

        self.display()
    }

    fn update_detecting(&mut self, hand_present: bool, candidate: Option<&Candidate>) {
        if !hand_present {
            self.mismatch_count += 1;
            if self.mismatch_count > self.config.max_mismatch {
                debug!("Debouncer: hand lost while detecting");
                self.reset();
            }
            return;
        }

        match (candidate, self.held_label.as_deref()) {
            (Some(c), Some(held)) if c.label == held => {
                self.match_count += 1;
                self.mismatch_count = 0;
                self.remember(c);
                self.promote_if_ready();
            }
            // Nothing held yet: the first candidate starts the run
            (Some(_), None) => self.restart(candidate),
            (None, None) => self.mismatch_count = 0,
            _ => {
                self.mismatch_count += 1;
                if self.mismatch_count > self.config.max_mismatch {
                    debug!(
                        "Debouncer: restarting on {:?} after {} dissenting frames",
                        candidate.map(|c| c.label.as_str()),
                        self.mismatch_count
                    );
                    self.restart(candidate);
                }
            }
        }
    }

    fn update_confirmed(&mut self, hand_present: bool, candidate: Option<&Candidate>) {
        if !hand_present {
            self.mismatch_count += 1;
            if self.mismatch_count >= self.config.exit_threshold {
                info!("Debouncer: released {:?} (hand gone)", self.held_label);
                self.reset();
            }
            return;
        }

        match candidate {
            Some(c) if self.held_label.as_deref() == Some(c.label.as_str()) => {
                self.mismatch_count = 0;
                self.remember(c);
            }
            _ => {
                self.mismatch_count += 1;
                if self.mismatch_count > self.config.max_mismatch {
                    info!(
                        "Debouncer: released {:?}, now tracking {:?}",
                        self.held_label,
                        candidate.map(|c| c.label.as_str())
                    );
                    self.state = FsmState::Detecting;
                    self.restart(candidate);
                }
            }
        }
    }

    /// Start a fresh accumulation run from this frame
    fn restart(&mut self, candidate: Option<&Candidate>) {
        self.mismatch_count = 0;
        match candidate {
            Some(c) => {
                self.held_label = Some(c.label.clone());
                self.match_count = 1;
                self.remember(c);
                self.promote_if_ready();
            }
            None => {
                self.held_label = None;
                self.match_count = 0;
                self.last_confidence = 0.0;
                self.last_method = Method::None;
            }
        }
    }

    fn remember(&mut self, c: &Candidate) {
        self.last_confidence = c.confidence;
        self.last_method = c.method;
    }

    fn promote_if_ready(&mut self) {
        if self.match_count >= self.config.enter_threshold && self.held_label.is_some() {
            self.state = FsmState::Confirmed;
            info!(
                "✓ Confirmed {} ({:.2}, {})",
                self.held_label.as_deref().unwrap_or_default(),
                self.last_confidence,
                self.last_method.as_str()
            );
        }
    }

    pub fn display(&self) -> DisplayState {
        match (self.state, &self.held_label) {
            (FsmState::Confirmed, Some(label)) => DisplayState::Confirmed {
                label: label.clone(),
                confidence: self.last_confidence,
                method: self.last_method,
            },
            (FsmState::Detecting, Some(_)) => DisplayState::Stabilizing,
            (FsmState::Detecting, None) => DisplayState::Detecting,
            _ => DisplayState::NoHand,
        }
    }
}
