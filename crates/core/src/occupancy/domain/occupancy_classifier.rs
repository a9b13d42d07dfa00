use std::collections::HashSet;

use thiserror::Error;

use crate::occupancy::domain::occupancy_frame::{AmbiguousAssignment, OccupancyFrame};
use crate::occupancy::domain::region_registry::RegionRegistry;
use crate::shared::detection::Detection;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierConfigError {
    #[error("target_classes must name at least one class id")]
    NoTargetClasses,
    #[error("min_confidence must be within [0, 1], got {0}")]
    MinConfidenceOutOfRange(f64),
}

/// Maps one frame's detections onto the region registry.
///
/// Implementations must be stateless across calls so one instance can be
/// shared between concurrently monitored lots.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, detections: &[Detection], registry: &RegionRegistry) -> OccupancyFrame;
}

/// Point-in-polygon occupancy classifier.
///
/// A detection qualifies when its class is a target class and its
/// confidence is at least `min_confidence`. Each qualifying detection's
/// box center marks at most one region occupied.
#[derive(Clone, Debug)]
pub struct OccupancyClassifier {
    target_classes: HashSet<u32>,
    min_confidence: f64,
}

impl OccupancyClassifier {
    pub fn new(
        target_classes: HashSet<u32>,
        min_confidence: f64,
    ) -> Result<Self, ClassifierConfigError> {
        if target_classes.is_empty() {
            return Err(ClassifierConfigError::NoTargetClasses);
        }
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ClassifierConfigError::MinConfidenceOutOfRange(
                min_confidence,
            ));
        }
        Ok(Self {
            target_classes,
            min_confidence,
        })
    }

    pub fn target_classes(&self) -> &HashSet<u32> {
        &self.target_classes
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// NaN confidences never qualify.
    pub fn qualifies(&self, detection: &Detection) -> bool {
        self.target_classes.contains(&detection.class_id)
            && detection.confidence >= self.min_confidence
    }
}

impl FrameClassifier for OccupancyClassifier {
    fn classify(&self, detections: &[Detection], registry: &RegionRegistry) -> OccupancyFrame {
        let regions = registry.regions();
        let mut occupied = vec![false; regions.len()];
        let mut ambiguous = Vec::new();

        for (index, detection) in detections.iter().enumerate() {
            if !self.qualifies(detection) {
                continue;
            }
            let point = detection.reference_point();
            let mut hits = regions
                .iter()
                .enumerate()
                .filter(|(_, region)| region.contains(point));

            let Some((position, assigned)) = hits.next() else {
                continue;
            };
            occupied[position] = true;

            let also_inside: Vec<_> = hits.map(|(_, region)| region.id).collect();
            if !also_inside.is_empty() {
                log::warn!(
                    "Detection {index} at ({:.1}, {:.1}) lies in overlapping regions {} and {also_inside:?}; assigned to region {}",
                    point.x,
                    point.y,
                    assigned.id,
                    assigned.id
                );
                ambiguous.push(AmbiguousAssignment {
                    detection_index: index,
                    reference_point: point,
                    assigned_region: assigned.id,
                    also_inside,
                });
            }
        }

        let slots = regions
            .iter()
            .zip(occupied)
            .map(|(region, occupied)| (region.id, occupied))
            .collect();
        OccupancyFrame::new(slots, ambiguous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::domain::region::Region;
    use crate::shared::detection::BoundingBox;
    use rstest::rstest;
    use std::sync::Arc;

    const CAR: u32 = 2;
    const PERSON: u32 = 0;

    fn unit_registry() -> RegionRegistry {
        RegionRegistry::new(vec![Region::new(
            1,
            vec![(0, 0), (0, 10), (10, 10), (10, 0)],
        )])
        .unwrap()
    }

    fn row_registry() -> RegionRegistry {
        RegionRegistry::new(
            (0..3)
                .map(|i| {
                    let x = i * 20;
                    Region::new(
                        i as u32 + 1,
                        vec![(x, 0), (x, 10), (x + 10, 10), (x + 10, 0)],
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn classifier() -> OccupancyClassifier {
        OccupancyClassifier::new(HashSet::from([CAR]), 0.5).unwrap()
    }

    fn car(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), CAR, 0.9)
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn test_empty_target_classes_rejected() {
        assert_eq!(
            OccupancyClassifier::new(HashSet::new(), 0.5).unwrap_err(),
            ClassifierConfigError::NoTargetClasses
        );
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_min_confidence_out_of_range(#[case] value: f64) {
        assert!(matches!(
            OccupancyClassifier::new(HashSet::from([CAR]), value),
            Err(ClassifierConfigError::MinConfidenceOutOfRange(_))
        ));
    }

    // ── Single region scenario ───────────────────────────────────────

    #[test]
    fn test_detection_inside_square_marks_occupied() {
        let frame = classifier().classify(&[car(2.0, 2.0, 4.0, 4.0)], &unit_registry());
        assert_eq!(frame.is_occupied(1), Some(true));
    }

    #[test]
    fn test_detection_outside_square_leaves_vacant() {
        let frame = classifier().classify(&[car(20.0, 20.0, 24.0, 24.0)], &unit_registry());
        assert_eq!(frame.is_occupied(1), Some(false));
    }

    #[test]
    fn test_center_on_edge_counts_as_inside() {
        // Box straddles the right edge; center (10, 5) sits on it.
        let frame = classifier().classify(&[car(6.0, 3.0, 14.0, 7.0)], &unit_registry());
        assert_eq!(frame.is_occupied(1), Some(true));
    }

    #[test]
    fn test_center_is_not_truncated() {
        // Center (10.5, 10.5) is outside; truncation would yield (10, 10).
        let frame = classifier().classify(&[car(10.0, 10.0, 11.0, 11.0)], &unit_registry());
        assert_eq!(frame.is_occupied(1), Some(false));
    }

    // ── Coverage and exclusivity ─────────────────────────────────────

    #[test]
    fn test_frame_covers_every_region() {
        let registry = row_registry();
        let frame = classifier().classify(&[], &registry);
        let ids: Vec<_> = frame.region_ids().collect();
        assert_eq!(ids, registry.ids().collect::<Vec<_>>());
        assert_eq!(frame.occupied_count(), 0);
    }

    #[test]
    fn test_detection_marks_only_its_region() {
        let frame = classifier().classify(&[car(22.0, 2.0, 28.0, 8.0)], &row_registry());
        assert_eq!(frame.slots(), &[(1, false), (2, true), (3, false)]);
    }

    #[test]
    fn test_multiple_detections_in_one_region() {
        let frame = classifier().classify(
            &[car(1.0, 1.0, 3.0, 3.0), car(6.0, 6.0, 8.0, 8.0)],
            &row_registry(),
        );
        assert_eq!(frame.slots(), &[(1, true), (2, false), (3, false)]);
        assert!(frame.ambiguous_assignments().is_empty());
    }

    // ── Filtering ────────────────────────────────────────────────────

    #[rstest]
    #[case::wrong_class(Detection::new(BoundingBox::new(2.0, 2.0, 4.0, 4.0), PERSON, 0.9))]
    #[case::low_confidence(Detection::new(BoundingBox::new(2.0, 2.0, 4.0, 4.0), CAR, 0.49))]
    #[case::nan_confidence(Detection::new(BoundingBox::new(2.0, 2.0, 4.0, 4.0), CAR, f64::NAN))]
    fn test_irrelevant_detection_has_no_effect(#[case] noise: Detection) {
        let registry = row_registry();
        let base = vec![car(42.0, 2.0, 48.0, 8.0)];
        let mut noisy = base.clone();
        noisy.push(noise);

        let c = classifier();
        assert_eq!(
            c.classify(&base, &registry).slots(),
            c.classify(&noisy, &registry).slots()
        );
    }

    #[test]
    fn test_confidence_at_threshold_qualifies() {
        let detection = Detection::new(BoundingBox::new(2.0, 2.0, 4.0, 4.0), CAR, 0.5);
        assert!(classifier().qualifies(&detection));
    }

    // ── Overlap ──────────────────────────────────────────────────────

    #[test]
    fn test_overlap_assigned_to_first_region_in_registry_order() {
        let registry = RegionRegistry::new(vec![
            Region::new(5, vec![(0, 0), (0, 10), (10, 10), (10, 0)]),
            Region::new(3, vec![(5, 0), (5, 10), (15, 10), (15, 0)]),
        ])
        .unwrap();
        let frame = classifier().classify(&[car(6.0, 4.0, 8.0, 6.0)], &registry);

        assert_eq!(frame.slots(), &[(5, true), (3, false)]);
        let ambiguous = frame.ambiguous_assignments();
        assert_eq!(ambiguous.len(), 1);
        assert_eq!(ambiguous[0].detection_index, 0);
        assert_eq!(ambiguous[0].assigned_region, 5);
        assert_eq!(ambiguous[0].also_inside, vec![3]);
    }

    #[test]
    fn test_shared_edge_is_ambiguous() {
        // Adjacent slots share x = 10; a center on it belongs to both.
        let registry = RegionRegistry::new(vec![
            Region::new(1, vec![(0, 0), (0, 10), (10, 10), (10, 0)]),
            Region::new(2, vec![(10, 0), (10, 10), (20, 10), (20, 0)]),
        ])
        .unwrap();
        let frame = classifier().classify(&[car(8.0, 4.0, 12.0, 6.0)], &registry);
        assert_eq!(frame.slots(), &[(1, true), (2, false)]);
        assert_eq!(frame.ambiguous_assignments().len(), 1);
    }

    // ── Determinism and sharing ──────────────────────────────────────

    #[test]
    fn test_repeated_calls_are_identical() {
        let registry = row_registry();
        let c = classifier();
        let detections = vec![car(2.0, 2.0, 8.0, 8.0), car(41.0, 1.0, 49.0, 9.0)];
        let first = c.classify(&detections, &registry);
        for _ in 0..5 {
            assert_eq!(c.classify(&detections, &registry), first);
        }
    }

    #[test]
    fn test_shared_across_threads() {
        let c: Arc<dyn FrameClassifier> = Arc::new(classifier());
        let registry = Arc::new(row_registry());

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|i| {
                    let c = Arc::clone(&c);
                    let registry = Arc::clone(&registry);
                    scope.spawn(move || {
                        let x = i as f64 * 20.0;
                        c.classify(&[car(x + 2.0, 2.0, x + 8.0, 8.0)], &registry)
                    })
                })
                .collect();

            for (i, handle) in handles.into_iter().enumerate() {
                let frame = handle.join().unwrap();
                assert_eq!(frame.occupied_count(), 1);
                assert_eq!(frame.is_occupied(i as u32 + 1), Some(true));
            }
        });
    }
}
