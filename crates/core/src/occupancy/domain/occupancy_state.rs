use serde::Serialize;

use crate::occupancy::domain::region::RegionId;

/// Stabilized decision for one slot.
///
/// `score` is the evidence behind the decision: the occupied fraction of
/// the window for the majority rule, the smoothed value for the EMA rule.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotState {
    pub region_id: RegionId,
    pub occupied: bool,
    pub score: f64,
}

/// Snapshot of every slot's stabilized occupancy, in registry order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OccupancyState {
    pub slots: Vec<SlotState>,
    pub frames_observed: usize,
}

impl OccupancyState {
    pub fn get(&self, id: RegionId) -> Option<&SlotState> {
        self.slots.iter().find(|s| s.region_id == id)
    }

    pub fn is_occupied(&self, id: RegionId) -> Option<bool> {
        self.get(id).map(|s| s.occupied)
    }

    /// The lot-level figure reported upstream.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    pub fn vacant_count(&self) -> usize {
        self.slots.len() - self.occupied_count()
    }

    pub fn occupied_ids(&self) -> Vec<RegionId> {
        self.slots
            .iter()
            .filter(|s| s.occupied)
            .map(|s| s.region_id)
            .collect()
    }

    pub fn vacant_ids(&self) -> Vec<RegionId> {
        self.slots
            .iter()
            .filter(|s| !s.occupied)
            .map(|s| s.region_id)
            .collect()
    }
}
