use std::collections::{HashSet, VecDeque};

use crate::occupancy::domain::decision_rule::{
    AggregatorConfig, AggregatorConfigError, DecisionRule,
};
use crate::occupancy::domain::occupancy_frame::OccupancyFrame;
use crate::occupancy::domain::occupancy_state::{OccupancyState, SlotState};
use crate::occupancy::domain::region::RegionId;
use crate::occupancy::domain::region_registry::RegionRegistry;
use crate::shared::constants::OCCUPIED_SCORE_THRESHOLD;

/// Per-slot evidence carried between frames.
#[derive(Clone, Debug)]
struct SlotEvidence {
    region_id: RegionId,
    history: VecDeque<bool>,
    score: f64,
    occupied: bool,
}

impl SlotEvidence {
    fn new(region_id: RegionId, window_size: usize) -> Self {
        Self {
            region_id,
            history: VecDeque::with_capacity(window_size),
            score: 0.0,
            occupied: false,
        }
    }

    fn clear(&mut self) {
        self.history.clear();
        self.score = 0.0;
        self.occupied = false;
    }

    fn snapshot(&self) -> SlotState {
        SlotState {
            region_id: self.region_id,
            occupied: self.occupied,
            score: self.score,
        }
    }
}

/// Stabilizes noisy per-frame occupancy into a per-slot decision.
///
/// One instance per monitored lot; frames must be observed in arrival
/// order. Not meant to be shared between streams without external
/// synchronization.
#[derive(Clone, Debug)]
pub struct TemporalAggregator {
    rule: DecisionRule,
    window_size: usize,
    slots: Vec<SlotEvidence>,
    frames_observed: usize,
}

impl TemporalAggregator {
    pub fn new(
        registry: &RegionRegistry,
        window_size: usize,
        rule: DecisionRule,
    ) -> Result<Self, AggregatorConfigError> {
        if window_size == 0 {
            return Err(AggregatorConfigError::ZeroWindow);
        }
        if let DecisionRule::Ema { alpha } = rule {
            DecisionRule::ema(alpha)?;
        }
        Ok(Self {
            rule,
            window_size,
            slots: registry
                .ids()
                .map(|id| SlotEvidence::new(id, window_size))
                .collect(),
            frames_observed: 0,
        })
    }

    pub fn from_config(
        registry: &RegionRegistry,
        config: &AggregatorConfig,
    ) -> Result<Self, AggregatorConfigError> {
        Self::new(registry, config.window_size, config.decision_rule()?)
    }

    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Folds one frame into the evidence and returns the new snapshot.
    ///
    /// Regions missing from the frame are observed as vacant; ids the
    /// registry does not know are ignored. Both cases are logged.
    pub fn observe(&mut self, frame: &OccupancyFrame) -> OccupancyState {
        let mut missing = 0;
        for (position, slot) in self.slots.iter_mut().enumerate() {
            // Frames from the same registry line up positionally.
            let observed = match frame.slots().get(position) {
                Some(&(id, occupied)) if id == slot.region_id => Some(occupied),
                _ => frame.is_occupied(slot.region_id),
            };
            let observed = observed.unwrap_or_else(|| {
                missing += 1;
                false
            });

            match self.rule {
                DecisionRule::Majority => {
                    if slot.history.len() == self.window_size {
                        slot.history.pop_front();
                    }
                    slot.history.push_back(observed);
                    let hits = slot.history.iter().filter(|&&o| o).count();
                    let samples = slot.history.len();
                    slot.score = hits as f64 / samples as f64;
                    slot.occupied = hits * 2 > samples;
                }
                DecisionRule::Ema { alpha } => {
                    let value = if observed { 1.0 } else { 0.0 };
                    slot.score = alpha * value + (1.0 - alpha) * slot.score;
                    slot.occupied = slot.score >= OCCUPIED_SCORE_THRESHOLD;
                }
            }
        }

        let unknown = self.unknown_ids(frame);
        if missing > 0 || unknown > 0 {
            log::warn!(
                "Frame {} does not match the registry: {missing} region(s) missing, {unknown} unknown",
                self.frames_observed
            );
        }

        self.frames_observed += 1;
        self.state()
    }

    /// Distinct ids in `frame` that no slot of this aggregator tracks.
    fn unknown_ids(&self, frame: &OccupancyFrame) -> usize {
        frame
            .region_ids()
            .filter(|id| self.slots.iter().all(|slot| slot.region_id != *id))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Drops all history, e.g. before a new video of the same lot.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.frames_observed = 0;
    }

    pub fn state(&self) -> OccupancyState {
        OccupancyState {
            slots: self.slots.iter().map(SlotEvidence::snapshot).collect(),
            frames_observed: self.frames_observed,
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }
}
