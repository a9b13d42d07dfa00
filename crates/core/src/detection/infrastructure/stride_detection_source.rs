use crate::detection::domain::detection_source::{DetectionSource, FrameDetections};

/// Decorator that forwards every Nth frame from the wrapped source.
///
/// Dropped frames never reach the aggregator, so a window of `w` frames
/// covers `w * stride` source frames. Read errors are always forwarded,
/// even for frames that would have been skipped.
pub struct StrideDetectionSource {
    inner: Box<dyn DetectionSource>,
    stride: usize,
}

impl StrideDetectionSource {
    pub fn new(inner: Box<dyn DetectionSource>, stride: usize) -> Result<Self, &'static str> {
        if stride < 1 {
            return Err("stride must be >= 1");
        }
        Ok(Self { inner, stride })
    }
}

impl DetectionSource for StrideDetectionSource {
    fn total_frames(&self) -> Option<usize> {
        self.inner
            .total_frames()
            .map(|total| total.div_ceil(self.stride))
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FrameDetections, Box<dyn std::error::Error>>> + '_> {
        let stride = self.stride;
        Box::new(
            self.inner
                .frames()
                .enumerate()
                .filter(move |(i, item)| item.is_err() || i % stride == 0)
                .map(|(_, item)| item),
        )
    }
}
