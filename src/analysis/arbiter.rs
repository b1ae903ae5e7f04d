// src/analysis/arbiter.rs
//
// One decision per frame. Rules take precedence over the statistical
// classifier; the classifier is only consulted when no rule fires.

use super::rules::RuleBank;
use super::statistical::StatisticalAdapter;
use crate::types::{Candidate, Decision, HandObservation, LandmarkFrame, UndecidedReason};
use tracing::debug;

pub struct HybridArbiter {
    rules: RuleBank,
    statistical: StatisticalAdapter,
}

impl HybridArbiter {
    pub fn new(rules: RuleBank, statistical: StatisticalAdapter) -> Self {
        Self { rules, statistical }
    }

    pub fn rules(&self) -> &RuleBank {
        &self.rules
    }

    pub fn statistical(&self) -> &StatisticalAdapter {
        &self.statistical
    }

    pub fn decide(
        &self,
        hand: Option<&HandObservation>,
        previous: Option<&LandmarkFrame>,
    ) -> Decision {
        let hand = match hand {
            Some(h) => h,
            None => return Decision::NoHand,
        };

        match self.rules.classify(hand) {
            Ok(Some(label)) => return Decision::Matched(Candidate::rule(label)),
            Ok(None) => {}
            Err(e) => {
                // A frame the rules cannot normalize is not fit for the model either
                debug!("Frame rejected: {}", e);
                return Decision::Undecided(UndecidedReason::InvalidFrame);
            }
        }

        match self.statistical.evaluate(hand, previous) {
            Ok(candidate) => Decision::Matched(candidate),
            Err(reason) => Decision::Undecided(reason),
        }
    }
}
