// src/analysis/testing.rs
//
// Synthetic canonical right hands for unit tests. Wrist at (0.5, 0.8),
// middle MCP at (0.5, 0.6) so the scale reference is 0.2 before scaling.

use super::geometry::Finger;
use crate::types::{Handedness, HandObservation, Landmark, LandmarkFrame, LANDMARK_COUNT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FingerPose {
    Extended,
    Curled,
    /// Straight finger reaching to a contact point
    Touch(f32, f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThumbPose {
    /// Folded against the index base
    Alongside,
    /// Sticking out sideways
    Out,
    /// Pointing up
    Up,
    /// Lying across curled fingers
    Across,
    Touch(f32, f32),
}

const WRIST: (f32, f32) = (0.5, 0.8);
const MCPS: [(f32, f32); 4] = [(0.545, 0.605), (0.5, 0.6), (0.455, 0.605), (0.415, 0.615)];
const SPREAD_DX: [f32; 4] = [0.05, 0.0, -0.05, -0.09];
const THUMB_CMC: (f32, f32) = (0.56, 0.76);
const THUMB_MCP: (f32, f32) = (0.60, 0.71);

#[derive(Debug, Clone)]
pub struct HandBuilder {
    fingers: [FingerPose; 4],
    thumb: ThumbPose,
    spread: bool,
    scale: f32,
    shift: (f32, f32),
}

fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn slot(finger: Finger) -> usize {
    match finger {
        Finger::Index => 0,
        Finger::Middle => 1,
        Finger::Ring => 2,
        Finger::Pinky => 3,
    }
}

impl HandBuilder {
    /// Flat hand: four fingers extended together, thumb alongside
    pub fn new() -> Self {
        Self {
            fingers: [FingerPose::Extended; 4],
            thumb: ThumbPose::Alongside,
            spread: false,
            scale: 1.0,
            shift: (0.0, 0.0),
        }
    }

    pub fn curl(mut self, finger: Finger) -> Self {
        self.fingers[slot(finger)] = FingerPose::Curled;
        self
    }

    pub fn curl_all(mut self) -> Self {
        self.fingers = [FingerPose::Curled; 4];
        self
    }

    pub fn touch(mut self, finger: Finger, x: f32, y: f32) -> Self {
        self.fingers[slot(finger)] = FingerPose::Touch(x, y);
        self
    }

    pub fn thumb(mut self, pose: ThumbPose) -> Self {
        self.thumb = pose;
        self
    }

    pub fn spread(mut self) -> Self {
        self.spread = true;
        self
    }

    /// Uniform zoom about the wrist
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale = factor;
        self
    }

    pub fn shifted(mut self, dx: f32, dy: f32) -> Self {
        self.shift = (dx, dy);
        self
    }

    pub fn build(&self) -> LandmarkFrame {
        let mut pts = [(0.0f32, 0.0f32); LANDMARK_COUNT];
        pts[0] = WRIST;
        pts[1] = THUMB_CMC;
        pts[2] = THUMB_MCP;
        let (ip, tip) = match self.thumb {
            ThumbPose::Alongside => ((0.58, 0.66), (0.56, 0.63)),
            ThumbPose::Out => ((0.66, 0.66), (0.71, 0.62)),
            ThumbPose::Up => ((0.63, 0.58), (0.64, 0.48)),
            ThumbPose::Across => ((0.57, 0.62), (0.52, 0.58)),
            ThumbPose::Touch(x, y) => (lerp(THUMB_MCP, (x, y), 0.6), (x, y)),
        };
        pts[3] = ip;
        pts[4] = tip;

        for (i, pose) in self.fingers.iter().enumerate() {
            let mcp = MCPS[i];
            let base = 5 + i * 4;
            let (pip, dip, tip) = match *pose {
                FingerPose::Extended => {
                    let dx = if self.spread { SPREAD_DX[i] } else { 0.0 };
                    (
                        (mcp.0 + dx * 0.5, mcp.1 - 0.07),
                        (mcp.0 + dx * 0.8, mcp.1 - 0.11),
                        (mcp.0 + dx, mcp.1 - 0.14),
                    )
                }
                FingerPose::Curled => (
                    (mcp.0, mcp.1 - 0.05),
                    (mcp.0, mcp.1 - 0.02),
                    (mcp.0, mcp.1 + 0.01),
                ),
                FingerPose::Touch(x, y) => {
                    (lerp(mcp, (x, y), 0.5), lerp(mcp, (x, y), 0.8), (x, y))
                }
            };
            pts[base] = mcp;
            pts[base + 1] = pip;
            pts[base + 2] = dip;
            pts[base + 3] = tip;
        }

        let points: Vec<Landmark> = pts
            .iter()
            .map(|&(x, y)| {
                Landmark::new(
                    WRIST.0 + (x - WRIST.0) * self.scale + self.shift.0,
                    WRIST.1 + (y - WRIST.1) * self.scale + self.shift.1,
                    0.0,
                )
            })
            .collect();
        LandmarkFrame::from_slice(&points).expect("synthetic hand has 21 finite points")
    }

    /// As seen by the detector. Left hands are stored mirrored.
    pub fn observation(&self, handedness: Handedness) -> HandObservation {
        let frame = self.build();
        let landmarks = match handedness {
            Handedness::Right => frame,
            Handedness::Left => frame.mirrored(),
        };
        HandObservation::new(landmarks, handedness)
    }
}

impl Default for HandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical pose for each rule-based mudra
pub fn preset(name: &str) -> HandBuilder {
    use Finger::*;
    match name {
        "Pataka" => HandBuilder::new(),
        "Ardhachandra" => HandBuilder::new().thumb(ThumbPose::Out),
        "Alapadma" => HandBuilder::new().spread().thumb(ThumbPose::Out),
        "Tripataka" => HandBuilder::new().curl(Ring),
        "Ardhapataka" => HandBuilder::new().curl(Ring).curl(Pinky),
        "Kartarimukha" => HandBuilder::new().spread().curl(Ring).curl(Pinky),
        "Trishula" => HandBuilder::new().curl(Pinky).thumb(ThumbPose::Across),
        "Suchi" => HandBuilder::new()
            .curl(Middle)
            .curl(Ring)
            .curl(Pinky)
            .thumb(ThumbPose::Across),
        "Mushti" => HandBuilder::new().curl_all().thumb(ThumbPose::Across),
        "Shikhara" => HandBuilder::new().curl_all().thumb(ThumbPose::Up),
        "Hamsasya" => HandBuilder::new()
            .touch(Index, 0.60, 0.50)
            .thumb(ThumbPose::Touch(0.605, 0.505)),
        "Mayura" => HandBuilder::new()
            .touch(Ring, 0.48, 0.50)
            .thumb(ThumbPose::Touch(0.485, 0.505)),
        "Mukula" => HandBuilder::new()
            .touch(Index, 0.52, 0.45)
            .touch(Middle, 0.51, 0.445)
            .touch(Ring, 0.50, 0.45)
            .touch(Pinky, 0.495, 0.455)
            .thumb(ThumbPose::Touch(0.525, 0.455)),
        other => panic!("no preset for {}", other),
    }
}
