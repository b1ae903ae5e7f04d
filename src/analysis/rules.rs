// src/analysis/rules.rs
//
// Deterministic single-hand mudra rules over the raw landmark frame.
//
// Evaluation order is part of the contract: the first matching rule wins.
// Contact mudras (fingertips touching) are checked first because they are
// the most specific; open-hand mudras go last. A bunched Mukula hand also
// satisfies Hamsasya and Mayura, and the order resolves it to Mukula.
//
//   Mukula → Hamsasya → Mayura → Trishula → Kartarimukha → Ardhapataka
//   → Tripataka → Suchi → Shikhara → Mushti → Alapadma → Ardhachandra → Pataka

use super::geometry::{self, landmarks::*, Finger};
use crate::error::EngineError;
use crate::types::{HandObservation, LandmarkFrame};
use tracing::debug;

// ============================================================================
// THRESHOLDS (fractions of the scale reference)
// ============================================================================
const CONTACT_MAX: f32 = 0.2;
const BUNCH_RADIUS: f32 = 0.25;
const SCISSOR_SPREAD_MIN: f32 = 0.35;
const FINGERS_TOGETHER_MAX: f32 = 0.3;
const FAN_GAP_MIN: f32 = 0.3;
const THUMB_OUT_MIN: f32 = 0.35;
const THUMB_RISE_MIN: f32 = 0.5;

/// Per-frame geometry computed once and shared by every predicate
pub struct RuleContext<'a> {
    pub frame: &'a LandmarkFrame,
    pub scale: f32,
    extended: [bool; 4],
    curled: [bool; 4],
    pub thumb_extended: bool,
}

impl<'a> RuleContext<'a> {
    pub fn new(frame: &'a LandmarkFrame) -> Result<Self, EngineError> {
        let scale = geometry::scale_reference(frame)?;
        let extended = Finger::ALL.map(|f| geometry::is_extended(frame, f));
        let curled = Finger::ALL.map(|f| geometry::is_curled(frame, f));
        Ok(Self {
            frame,
            scale,
            extended,
            curled,
            thumb_extended: geometry::thumb_extended(frame, scale),
        })
    }

    fn ext(&self, finger: Finger) -> bool {
        self.extended[finger as usize]
    }

    fn curl(&self, finger: Finger) -> bool {
        self.curled[finger as usize]
    }

    fn all_extended(&self) -> bool {
        self.extended.iter().all(|&e| e)
    }

    fn all_curled(&self) -> bool {
        self.curled.iter().all(|&c| c)
    }

    fn gap(&self, a: usize, b: usize) -> f32 {
        geometry::gap(self.frame, a, b, self.scale)
    }

    fn fingers_together(&self) -> bool {
        geometry::max_adjacent_tip_gap(self.frame, self.scale) <= FINGERS_TOGETHER_MAX
    }
}

pub type RulePredicate = fn(&RuleContext) -> bool;

pub struct MudraRule {
    pub name: &'static str,
    predicate: RulePredicate,
}

impl MudraRule {
    pub fn new(name: &'static str, predicate: RulePredicate) -> Self {
        Self { name, predicate }
    }

    pub fn matches(&self, ctx: &RuleContext) -> bool {
        (self.predicate)(ctx)
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

use Finger::{Index, Middle, Pinky, Ring};

/// All five fingertips gathered to one point
fn mukula(c: &RuleContext) -> bool {
    let centroid = geometry::fingertip_centroid(c.frame);
    let bunched = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP]
        .iter()
        .all(|&t| c.frame.point(t).distance(&centroid) / c.scale < BUNCH_RADIUS);
    bunched && !c.curled.iter().any(|&x| x)
}

/// Thumb meets index tip, other three fingers extended
fn hamsasya(c: &RuleContext) -> bool {
    c.gap(THUMB_TIP, INDEX_TIP) < CONTACT_MAX && c.ext(Middle) && c.ext(Ring) && c.ext(Pinky)
}

/// Thumb meets ring tip, other three fingers extended
fn mayura(c: &RuleContext) -> bool {
    c.gap(THUMB_TIP, RING_TIP) < CONTACT_MAX && c.ext(Index) && c.ext(Middle) && c.ext(Pinky)
}

/// Three middle fingers up, thumb holds the little finger
fn trishula(c: &RuleContext) -> bool {
    c.ext(Index) && c.ext(Middle) && c.ext(Ring) && c.curl(Pinky) && !c.thumb_extended
}

fn two_fingers_up(c: &RuleContext) -> bool {
    c.ext(Index) && c.ext(Middle) && c.curl(Ring) && c.curl(Pinky)
}

/// Index and middle up and parted like scissors
fn kartarimukha(c: &RuleContext) -> bool {
    two_fingers_up(c) && c.gap(INDEX_TIP, MIDDLE_TIP) > SCISSOR_SPREAD_MIN
}

/// Index and middle up and held together
fn ardhapataka(c: &RuleContext) -> bool {
    two_fingers_up(c) && c.gap(INDEX_TIP, MIDDLE_TIP) <= SCISSOR_SPREAD_MIN
}

/// Flat hand with the ring finger bent
fn tripataka(c: &RuleContext) -> bool {
    c.ext(Index) && c.ext(Middle) && c.curl(Ring) && c.ext(Pinky)
}

/// Index pointing, rest of the hand closed
fn suchi(c: &RuleContext) -> bool {
    c.ext(Index) && c.curl(Middle) && c.curl(Ring) && c.curl(Pinky) && !c.thumb_extended
}

/// Fist with the thumb raised
fn shikhara(c: &RuleContext) -> bool {
    let rise = geometry::thumb_rise(c.frame, c.scale);
    let lateral = geometry::thumb_lateral_reach(c.frame, c.scale);
    c.all_curled() && c.thumb_extended && rise > THUMB_RISE_MIN && rise > lateral.abs()
}

/// Closed fist, thumb over the fingers
fn mushti(c: &RuleContext) -> bool {
    c.all_curled() && !c.thumb_extended
}

/// Open hand with fingers fanned apart
fn alapadma(c: &RuleContext) -> bool {
    c.all_extended() && geometry::min_adjacent_tip_gap(c.frame, c.scale) > FAN_GAP_MIN
}

/// Flat hand, fingers together, thumb stretched out sideways
fn ardhachandra(c: &RuleContext) -> bool {
    c.all_extended()
        && c.fingers_together()
        && c.thumb_extended
        && geometry::thumb_lateral_reach(c.frame, c.scale) > THUMB_OUT_MIN
}

/// Flat hand, fingers together, thumb folded alongside
fn pataka(c: &RuleContext) -> bool {
    c.all_extended() && c.fingers_together() && !c.thumb_extended
}

// ============================================================================
// RULE BANK
// ============================================================================

pub struct RuleBank {
    rules: Vec<MudraRule>,
}

impl RuleBank {
    /// Bank with a caller-defined priority order
    pub fn new(rules: Vec<MudraRule>) -> Self {
        Self { rules }
    }

    /// The documented production order
    pub fn standard() -> Self {
        Self::new(vec![
            MudraRule::new("Mukula", mukula),
            MudraRule::new("Hamsasya", hamsasya),
            MudraRule::new("Mayura", mayura),
            MudraRule::new("Trishula", trishula),
            MudraRule::new("Kartarimukha", kartarimukha),
            MudraRule::new("Ardhapataka", ardhapataka),
            MudraRule::new("Tripataka", tripataka),
            MudraRule::new("Suchi", suchi),
            MudraRule::new("Shikhara", shikhara),
            MudraRule::new("Mushti", mushti),
            MudraRule::new("Alapadma", alapadma),
            MudraRule::new("Ardhachandra", ardhachandra),
            MudraRule::new("Pataka", pataka),
        ])
    }

    /// Rule names in evaluation order
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching rule for this hand, or None.
    /// Fails only on a degenerate scale reference.
    pub fn classify(&self, hand: &HandObservation) -> Result<Option<&'static str>, EngineError> {
        let frame = hand.canonical();
        let ctx = RuleContext::new(&frame)?;
        let hit = self.rules.iter().find(|r| r.matches(&ctx)).map(|r| r.name);
        debug!("Rule bank: {:?} (scale={:.4})", hit, ctx.scale);
        Ok(hit)
    }

    /// Every rule that fires, in priority order. Used to audit overlaps.
    pub fn matching(&self, hand: &HandObservation) -> Result<Vec<&'static str>, EngineError> {
        let frame = hand.canonical();
        let ctx = RuleContext::new(&frame)?;
        Ok(self
            .rules
            .iter()
            .filter(|r| r.matches(&ctx))
            .map(|r| r.name)
            .collect())
    }
}

impl Default for RuleBank {
    fn default() -> Self {
        Self::standard()
    }
}
