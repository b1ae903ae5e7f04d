// src/analysis/features.rs
//
// Scale-normalized feature vector for the statistical classifier.
//
// Layout (FEATURE_COUNT = 81):
//   [0..63)   21 landmarks relative to the wrist, divided by scale (x, y, z)
//   [63..68)  wrist → fingertip distances (thumb..pinky)
//   [68..71)  adjacent fingertip gaps (index-middle, middle-ring, ring-pinky)
//   [71..75)  thumb tip → other fingertip distances
//   [75..79)  PIP joint angles / 180 (index..pinky)
//   [79..81)  thumb lateral reach, thumb rise

use super::geometry::{self, landmarks::*, Finger};
use crate::error::EngineError;
use crate::types::{HandObservation, LANDMARK_COUNT};

pub const FEATURE_COUNT: usize = LANDMARK_COUNT * 3 + 5 + 3 + 4 + 4 + 2;

const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pure function of the observation. Fails with `DegenerateScale` when the
/// wrist→middle-MCP distance cannot normalize the frame.
pub fn extract_features(hand: &HandObservation) -> Result<FeatureVector, EngineError> {
    let frame = hand.canonical();
    let scale = geometry::scale_reference(&frame)?;
    let wrist = frame.point(WRIST);

    let mut v = Vec::with_capacity(FEATURE_COUNT);
    for p in frame.points() {
        v.push((p.x - wrist.x) / scale);
        v.push((p.y - wrist.y) / scale);
        v.push((p.z - wrist.z) / scale);
    }

    for &tip in &FINGERTIPS {
        v.push(geometry::gap(&frame, WRIST, tip, scale));
    }

    for pair in Finger::ALL.windows(2) {
        v.push(geometry::gap(&frame, pair[0].tip(), pair[1].tip(), scale));
    }

    for finger in Finger::ALL {
        v.push(geometry::gap(&frame, THUMB_TIP, finger.tip(), scale));
    }

    for finger in Finger::ALL {
        v.push(geometry::pip_angle(&frame, finger) / 180.0);
    }

    v.push(geometry::thumb_lateral_reach(&frame, scale));
    v.push(geometry::thumb_rise(&frame, scale));

    debug_assert_eq!(v.len(), FEATURE_COUNT);
    Ok(FeatureVector(v))
}
