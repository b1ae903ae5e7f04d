// src/types.rs

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debounce: DebounceConfig,
    pub classifier: ClassifierConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive matching frames required to confirm a label
    pub enter_threshold: u32,
    /// Consecutive no-hand frames required to release a confirmed label
    pub exit_threshold: u32,
    /// Dissenting frames tolerated before accumulation restarts
    pub max_mismatch: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        // Web-tuned values: faster than the webcam defaults (3 / 3 / 2)
        Self {
            enter_threshold: 2,
            exit_threshold: 2,
            max_mismatch: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// ONNX model path. None runs the engine rule-only.
    pub model_path: Option<String>,
    /// Class names in model output order
    pub classes: Vec<String>,
    /// Minimum accepted classifier probability (ML_CONF_THRESHOLD)
    pub confidence_threshold: f32,
    /// Max per-landmark displacement between frames treated as "held still"
    pub stability_bound: f32,
    /// Name of the model's input tensor
    pub input_name: String,
    pub num_threads: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            classes: Vec::new(),
            confidence_threshold: 0.6,
            stability_bound: 0.03,
            input_name: "input".to_string(),
            num_threads: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    /// Session id used when a request carries none
    pub default_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 60,
            default_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// LANDMARKS
// ============================================================================

pub const LANDMARK_COUNT: usize = 21;

/// One tracked hand point in normalized image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LandmarkRepr")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

// Accept both `[x, y, z]` and `{"x":..,"y":..,"z":..}` on the wire
#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkRepr {
    Triple([f32; 3]),
    Point {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
}

impl From<LandmarkRepr> for Landmark {
    fn from(repr: LandmarkRepr) -> Self {
        match repr {
            LandmarkRepr::Triple([x, y, z]) => Landmark { x, y, z },
            LandmarkRepr::Point { x, y, z } => Landmark { x, y, z },
        }
    }
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// The 21-point hand skeleton for one frame. Construction validates the
/// point count and rejects non-finite coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkFrame {
    points: [Landmark; LANDMARK_COUNT],
}

impl LandmarkFrame {
    pub fn from_slice(points: &[Landmark]) -> Result<Self, EngineError> {
        if points.len() != LANDMARK_COUNT {
            return Err(EngineError::InvalidFrame(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(EngineError::InvalidFrame(format!(
                "landmark {} has a non-finite coordinate",
                idx
            )));
        }
        let mut array = [Landmark::default(); LANDMARK_COUNT];
        array.copy_from_slice(points);
        Ok(Self { points: array })
    }

    pub fn point(&self, idx: usize) -> Landmark {
        self.points[idx]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Distance between two landmarks of this frame
    pub fn distance(&self, a: usize, b: usize) -> f32 {
        self.points[a].distance(&self.points[b])
    }

    /// Reflect across the vertical axis through the wrist
    pub fn mirrored(&self) -> Self {
        let pivot = self.points[0].x;
        let mut points = self.points;
        for p in points.iter_mut() {
            p.x = 2.0 * pivot - p.x;
        }
        Self { points }
    }

    /// Largest per-landmark displacement between two frames
    pub fn max_displacement(&self, other: &LandmarkFrame) -> f32 {
        self.points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| a.distance(b))
            .fold(0.0, f32::max)
    }

    pub fn to_triples(&self) -> Vec<[f32; 3]> {
        self.points.iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkFrame {
    type Error = EngineError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        Self::from_slice(&points)
    }
}

impl From<LandmarkFrame> for Vec<Landmark> {
    fn from(frame: LandmarkFrame) -> Self {
        frame.points.to_vec()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

/// Output of the pose detector for one frame: one hand and its side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: LandmarkFrame,
    #[serde(default)]
    pub handedness: Handedness,
}

impl HandObservation {
    pub fn new(landmarks: LandmarkFrame, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
        }
    }

    /// Landmarks expressed as a right hand. Left hands are mirrored.
    pub fn canonical(&self) -> LandmarkFrame {
        match self.handedness {
            Handedness::Right => self.landmarks.clone(),
            Handedness::Left => self.landmarks.mirrored(),
        }
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Which strategy produced a label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "RULE")]
    Rule,
    #[serde(rename = "ML")]
    Ml,
    #[default]
    #[serde(rename = "NONE")]
    None,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Rule => "RULE",
            Method::Ml => "ML",
            Method::None => "NONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub label: String,
    pub confidence: f32,
    pub method: Method,
}

impl Candidate {
    pub fn rule(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: 1.0,
            method: Method::Rule,
        }
    }

    pub fn ml(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            method: Method::Ml,
        }
    }
}

/// Why a frame with a visible hand produced no candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndecidedReason {
    InvalidFrame,
    InMotion,
    LowConfidence,
    ClassifierUnavailable,
    NoMatch,
}

/// Per-frame output of the hybrid arbiter
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoHand,
    Undecided(UndecidedReason),
    Matched(Candidate),
}

impl Decision {
    pub fn hand_present(&self) -> bool {
        !matches!(self, Decision::NoHand)
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Decision::Matched(c) => Some(c),
            _ => None,
        }
    }

    /// Undebounced label as shown in `raw_detection`
    pub fn raw_label(&self) -> String {
        match self {
            Decision::NoHand => NO_HAND_TEXT.to_string(),
            Decision::Undecided(UndecidedReason::InMotion) => STABILIZING_TEXT.to_string(),
            Decision::Undecided(_) => UNKNOWN_TEXT.to_string(),
            Decision::Matched(c) => c.label.clone(),
        }
    }
}

// ============================================================================
// DEBOUNCE OUTPUT
// ============================================================================

pub const NO_HAND_TEXT: &str = "No hand detected";
pub const DETECTING_TEXT: &str = "Detecting...";
pub const STABILIZING_TEXT: &str = "Stabilizing...";
pub const UNKNOWN_TEXT: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FsmState {
    #[default]
    #[serde(rename = "S0_NO_HAND")]
    NoHand,
    #[serde(rename = "S1_DETECTING")]
    Detecting,
    #[serde(rename = "S2_CONFIRMED")]
    Confirmed,
}

impl FsmState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FsmState::NoHand => "S0_NO_HAND",
            FsmState::Detecting => "S1_DETECTING",
            FsmState::Confirmed => "S2_CONFIRMED",
        }
    }
}

/// What the debouncer shows. Only `Confirmed` carries a label.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    /// Hand absent while nothing is held
    NoHand,
    /// Hand visible, no candidate being accumulated
    Detecting,
    /// Candidate being accumulated but not yet confirmed
    Stabilizing,
    Confirmed {
        label: String,
        confidence: f32,
        method: Method,
    },
}

impl DisplayState {
    pub fn text(&self) -> &str {
        match self {
            DisplayState::NoHand => NO_HAND_TEXT,
            DisplayState::Detecting => DETECTING_TEXT,
            DisplayState::Stabilizing => STABILIZING_TEXT,
            DisplayState::Confirmed { label, .. } => label,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            DisplayState::Confirmed { label, .. } => Some(label),
            _ => None,
        }
    }

    pub fn confidence(&self) -> f32 {
        match self {
            DisplayState::Confirmed { confidence, .. } => *confidence,
            _ => 0.0,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            DisplayState::Confirmed { method, .. } => *method,
            _ => Method::None,
        }
    }
}

/// Result of one `process_frame` call, as handed to the request layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameResult {
    pub session_id: String,
    pub hand_detected: bool,
    /// What this frame shows: the confirmed label, `"Unknown"` while
    /// unconfirmed, or the no-hand text when no hand is in this frame
    pub mudra: String,
    /// Label held by the debouncer. Survives up to `exit_threshold - 1`
    /// handless frames, so it can be set while `mudra` is the no-hand text.
    pub stable_label: Option<String>,
    /// Debouncer display for the session: the held label or a status text
    /// ("Detecting...", "Stabilizing...", "No hand detected")
    pub display_text: String,
    pub confidence: f32,
    pub method: Method,
    pub fsm_state: FsmState,
    pub raw_detection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<Vec<[f32; 3]>>,
}
