//! Replays detections recorded by an external detector.
//!
//! One JSON object per line:
//! `{"frame": 0, "detections": [{"box": [x1, y1, x2, y2], "class_id": 2, "confidence": 0.91}]}`.
//! `frame` is optional and defaults to one past the previous frame; when
//! given it must strictly increase so the aggregator sees frames in order.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::detection_source::{DetectionSource, FrameDetections};
use crate::shared::detection::{BoundingBox, Detection};

#[derive(Error, Debug)]
pub enum DetectionReadError {
    #[error("failed to open detections file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid detection on line {line}: {reason}")]
    InvalidDetection { line: usize, reason: String },
    #[error("frame {frame} on line {line} is not after frame {previous}")]
    OutOfOrder {
        line: usize,
        frame: usize,
        previous: usize,
    },
    #[error("frame {frame} on line {line} leaves no room for a following frame index")]
    IndexOverflow { line: usize, frame: usize },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameRecord {
    #[serde(default)]
    frame: Option<usize>,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetectionRecord {
    #[serde(rename = "box")]
    bbox: [f64; 4],
    class_id: u32,
    confidence: f64,
}

impl DetectionRecord {
    fn into_detection(self, line: usize) -> Result<Detection, DetectionReadError> {
        let [x1, y1, x2, y2] = self.bbox;
        let bbox = BoundingBox::new(x1, y1, x2, y2);
        if !bbox.is_finite() {
            return Err(DetectionReadError::InvalidDetection {
                line,
                reason: "box coordinates must be finite".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DetectionReadError::InvalidDetection {
                line,
                reason: format!("confidence {} is outside [0, 1]", self.confidence),
            });
        }
        Ok(Detection::new(bbox, self.class_id, self.confidence))
    }
}

pub struct JsonlDetectionReader {
    input: Box<dyn BufRead + Send>,
}

impl JsonlDetectionReader {
    pub fn open(path: &Path) -> Result<Self, DetectionReadError> {
        let file = File::open(path).map_err(|source| DetectionReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(input: impl BufRead + Send + 'static) -> Self {
        Self {
            input: Box::new(input),
        }
    }
}

impl DetectionSource for JsonlDetectionReader {
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<FrameDetections, Box<dyn std::error::Error>>> + '_> {
        let mut next_index = 0usize;
        let mut previous: Option<usize> = None;

        let iter = (&mut self.input)
            .lines()
            .enumerate()
            .filter_map(move |(i, line)| {
                let line_no = i + 1;
                let text = match line {
                    Ok(text) => text,
                    Err(source) => {
                        return Some(Err(DetectionReadError::Io {
                            line: line_no,
                            source,
                        }))
                    }
                };
                if text.trim().is_empty() {
                    return None;
                }
                Some(parse_line(&text, line_no, &mut next_index, &mut previous))
            })
            .map(|result| result.map_err(|e| Box::new(e) as Box<dyn std::error::Error>));
        Box::new(iter)
    }
}

fn parse_line(
    text: &str,
    line: usize,
    next_index: &mut usize,
    previous: &mut Option<usize>,
) -> Result<FrameDetections, DetectionReadError> {
    let record: FrameRecord =
        serde_json::from_str(text).map_err(|source| DetectionReadError::Parse { line, source })?;

    let index = record.frame.unwrap_or(*next_index);
    if let Some(prev) = *previous {
        if index <= prev {
            return Err(DetectionReadError::OutOfOrder {
                line,
                frame: index,
                previous: prev,
            });
        }
    }
    *next_index = index
        .checked_add(1)
        .ok_or(DetectionReadError::IndexOverflow { line, frame: index })?;
    *previous = Some(index);

    let detections = record
        .detections
        .into_iter()
        .map(|d| d.into_detection(line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FrameDetections { index, detections })
}
