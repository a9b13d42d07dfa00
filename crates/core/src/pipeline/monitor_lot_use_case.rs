use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::detection_source::DetectionSource;
use crate::occupancy::domain::occupancy_classifier::FrameClassifier;
use crate::occupancy::domain::occupancy_state::OccupancyState;
use crate::occupancy::domain::region_registry::RegionRegistry;
use crate::occupancy::domain::temporal_aggregator::TemporalAggregator;

/// Outcome of one monitoring run over a video's detections.
#[derive(Clone, Debug, PartialEq)]
pub struct LotReport {
    pub state: OccupancyState,
    pub frames_processed: usize,
    pub ambiguous_assignments: usize,
}

impl LotReport {
    /// Stabilized occupied-slot count after the last frame.
    pub fn occupied_count(&self) -> usize {
        self.state.occupied_count()
    }
}

/// Single-lot pipeline: detections → classify → aggregate.
///
/// The classifier and registry are shared handles so several lots (or
/// several runs) can use them concurrently; the aggregator is owned and
/// reset at the start of every run.
pub struct MonitorLotUseCase {
    source: Box<dyn DetectionSource>,
    classifier: Arc<dyn FrameClassifier>,
    registry: Arc<RegionRegistry>,
    aggregator: TemporalAggregator,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
}

impl MonitorLotUseCase {
    pub fn new(
        source: Box<dyn DetectionSource>,
        classifier: Arc<dyn FrameClassifier>,
        registry: Arc<RegionRegistry>,
        aggregator: TemporalAggregator,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    ) -> Self {
        Self {
            source,
            classifier,
            registry,
            aggregator,
            on_progress,
        }
    }

    /// Consumes the source and returns the final stabilized occupancy.
    ///
    /// The progress callback receives `(frames_processed, total)` where
    /// `total` is 0 when the source cannot tell; returning `false` cancels.
    pub fn execute(&mut self) -> Result<LotReport, Box<dyn std::error::Error>> {
        self.aggregator.reset();
        let total = self.source.total_frames().unwrap_or(0);
        let started = Instant::now();
        log::info!(
            "Monitoring {} slots ({:?}, window {})",
            self.registry.len(),
            self.aggregator.rule(),
            self.aggregator.window_size()
        );

        let mut frames_processed = 0;
        let mut ambiguous_assignments = 0;
        let mut state = self.aggregator.state();

        for item in self.source.frames() {
            let batch = item?;
            let frame = self.classifier.classify(&batch.detections, &self.registry);
            ambiguous_assignments += frame.ambiguous_assignments().len();
            state = self.aggregator.observe(&frame);
            frames_processed += 1;

            log::debug!(
                "Frame {}: {} detections, {} slots occupied raw, {} stabilized",
                batch.index,
                batch.detections.len(),
                frame.occupied_count(),
                state.occupied_count()
            );

            if let Some(ref callback) = self.on_progress {
                if !callback(frames_processed, total) {
                    return Err("Cancelled".into());
                }
            }
        }

        log::info!(
            "Processed {frames_processed} frames in {:.1}s: {}/{} slots occupied",
            started.elapsed().as_secs_f64(),
            state.occupied_count(),
            self.registry.len()
        );
        if ambiguous_assignments > 0 {
            log::warn!(
                "{ambiguous_assignments} detections fell in overlapping slots; check the calibration"
            );
        }

        Ok(LotReport {
            state,
            frames_processed,
            ambiguous_assignments,
        })
    }
}
