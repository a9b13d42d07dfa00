use crate::shared::detection::Detection;

/// Detections produced by the external detector for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDetections {
    pub index: usize,
    pub detections: Vec<Detection>,
}

/// Supplies per-frame detection batches in arrival order.
///
/// Implementations own the I/O (a replay file, a live detector bridge)
/// while the pipeline only sees `FrameDetections`.
pub trait DetectionSource: Send {
    /// Frame count if known up front; used for progress reporting only.
    fn total_frames(&self) -> Option<usize> {
        None
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FrameDetections, Box<dyn std::error::Error>>> + '_>;
}
