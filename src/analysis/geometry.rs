// src/analysis/geometry.rs
//
// Hand-skeleton geometry shared by the feature extractor and the rule bank.
// All helpers expect a canonical (right-hand) frame; thumb-side is +x.

use crate::error::EngineError;
use crate::types::{Landmark, LandmarkFrame};

/// Standard 21-point hand skeleton indices
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

use landmarks::*;

/// Below this the wrist→middle-MCP distance is treated as a collapsed hand
pub const MIN_SCALE_REFERENCE: f32 = 1e-4;

// Finger state thresholds (angles in degrees, distances as ratios)
const EXTENDED_PIP_ANGLE_DEG: f32 = 150.0;
const EXTENDED_REACH_RATIO: f32 = 1.1;
const THUMB_EXTENDED_REACH: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// (MCP, PIP, DIP, TIP)
    pub fn joints(&self) -> (usize, usize, usize, usize) {
        match self {
            Finger::Index => (INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP),
            Finger::Middle => (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP),
            Finger::Ring => (RING_MCP, RING_PIP, RING_DIP, RING_TIP),
            Finger::Pinky => (PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP),
        }
    }

    pub fn tip(&self) -> usize {
        self.joints().3
    }
}

/// Wrist to middle-finger MCP distance. Every rule threshold and every
/// feature distance is divided by this value.
pub fn scale_reference(frame: &LandmarkFrame) -> Result<f32, EngineError> {
    let scale = frame.distance(WRIST, MIDDLE_MCP);
    if !scale.is_finite() || scale < MIN_SCALE_REFERENCE {
        return Err(EngineError::DegenerateScale(scale));
    }
    Ok(scale)
}

/// Angle ABC at vertex `b`, in degrees. Zero-length arms yield 0.
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let v1 = [a.x - b.x, a.y - b.y, a.z - b.z];
    let v2 = [c.x - b.x, c.y - b.y, c.z - b.z];
    let dot = v1[0] * v2[0] + v1[1] * v2[1] + v1[2] * v2[2];
    let n1 = (v1[0] * v1[0] + v1[1] * v1[1] + v1[2] * v1[2]).sqrt();
    let n2 = (v2[0] * v2[0] + v2[1] * v2[1] + v2[2] * v2[2]).sqrt();
    if n1 < 1e-9 || n2 < 1e-9 {
        return 0.0;
    }
    (dot / (n1 * n2)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Bend at the PIP joint: 180° is straight
pub fn pip_angle(frame: &LandmarkFrame, finger: Finger) -> f32 {
    let (mcp, pip, _, tip) = finger.joints();
    angle_at(&frame.point(mcp), &frame.point(pip), &frame.point(tip))
}

/// Straight finger whose tip reaches well past its PIP joint
pub fn is_extended(frame: &LandmarkFrame, finger: Finger) -> bool {
    let (_, pip, _, tip) = finger.joints();
    pip_angle(frame, finger) > EXTENDED_PIP_ANGLE_DEG
        && frame.distance(WRIST, tip) > frame.distance(WRIST, pip) * EXTENDED_REACH_RATIO
}

/// Tip folded back closer to the wrist than the PIP joint
pub fn is_curled(frame: &LandmarkFrame, finger: Finger) -> bool {
    let (_, pip, _, tip) = finger.joints();
    frame.distance(WRIST, tip) < frame.distance(WRIST, pip)
}

/// Thumb reaching away from the palm (not folded against the index base)
pub fn thumb_extended(frame: &LandmarkFrame, scale: f32) -> bool {
    frame.distance(THUMB_TIP, INDEX_MCP) / scale > THUMB_EXTENDED_REACH
        && frame.distance(WRIST, THUMB_TIP) > frame.distance(WRIST, THUMB_IP)
}

/// Outward thumb displacement from the index base, in scale units.
/// Positive means the thumb sticks out sideways from the palm.
pub fn thumb_lateral_reach(frame: &LandmarkFrame, scale: f32) -> f32 {
    (frame.point(THUMB_TIP).x - frame.point(INDEX_MCP).x) / scale
}

/// Upward thumb rise above its MCP, in scale units (image y grows downward)
pub fn thumb_rise(frame: &LandmarkFrame, scale: f32) -> f32 {
    (frame.point(THUMB_MCP).y - frame.point(THUMB_TIP).y) / scale
}

/// Normalized distance between two landmarks
pub fn gap(frame: &LandmarkFrame, a: usize, b: usize, scale: f32) -> f32 {
    frame.distance(a, b) / scale
}

/// Largest normalized spread between neighbouring extended fingertips
pub fn max_adjacent_tip_gap(frame: &LandmarkFrame, scale: f32) -> f32 {
    Finger::ALL
        .windows(2)
        .map(|pair| gap(frame, pair[0].tip(), pair[1].tip(), scale))
        .fold(0.0, f32::max)
}

/// Smallest normalized spread between neighbouring fingertips
pub fn min_adjacent_tip_gap(frame: &LandmarkFrame, scale: f32) -> f32 {
    Finger::ALL
        .windows(2)
        .map(|pair| gap(frame, pair[0].tip(), pair[1].tip(), scale))
        .fold(f32::INFINITY, f32::min)
}

/// Centroid of the five fingertips
pub fn fingertip_centroid(frame: &LandmarkFrame) -> Landmark {
    let tips = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
    let mut c = Landmark::default();
    for &t in &tips {
        let p = frame.point(t);
        c.x += p.x;
        c.y += p.y;
        c.z += p.z;
    }
    let n = tips.len() as f32;
    Landmark::new(c.x / n, c.y / n, c.z / n)
}
