use crate::occupancy::domain::region::RegionId;
use crate::shared::polygon::Point;

/// A detection whose reference point fell inside more than one region.
///
/// The detection is credited to `assigned_region` (first in registry
/// order); `also_inside` lists the other regions it overlapped, which
/// points at a calibration defect rather than a runtime failure.
#[derive(Clone, Debug, PartialEq)]
pub struct AmbiguousAssignment {
    pub detection_index: usize,
    pub reference_point: Point,
    pub assigned_region: RegionId,
    pub also_inside: Vec<RegionId>,
}

/// Per-frame occupancy for every registered region, in registry order.
///
/// Produced once per frame and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyFrame {
    slots: Vec<(RegionId, bool)>,
    ambiguous: Vec<AmbiguousAssignment>,
}

impl OccupancyFrame {
    pub fn new(slots: Vec<(RegionId, bool)>, ambiguous: Vec<AmbiguousAssignment>) -> Self {
        Self { slots, ambiguous }
    }

    /// Builds a frame with no data-quality warnings attached.
    pub fn from_slots(slots: Vec<(RegionId, bool)>) -> Self {
        Self::new(slots, Vec::new())
    }

    pub fn slots(&self) -> &[(RegionId, bool)] {
        &self.slots
    }

    /// `None` when the region is not part of this frame.
    pub fn is_occupied(&self, id: RegionId) -> Option<bool> {
        self.slots
            .iter()
            .find(|(region_id, _)| *region_id == id)
            .map(|&(_, occupied)| occupied)
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.slots.iter().map(|&(id, _)| id)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|(_, occupied)| *occupied).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ambiguous_assignments(&self) -> &[AmbiguousAssignment] {
        &self.ambiguous
    }
}
