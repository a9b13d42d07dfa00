use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::occupancy::domain::decision_rule::{AggregatorConfig, AggregatorConfigError};
use crate::occupancy::domain::occupancy_classifier::{ClassifierConfigError, OccupancyClassifier};
use crate::occupancy::domain::region::{Region, RegionId};
use crate::occupancy::domain::region_registry::{RegionRegistry, RegistryError};
use crate::occupancy::domain::temporal_aggregator::TemporalAggregator;
use crate::shared::constants::DEFAULT_MIN_CONFIDENCE;

#[derive(Error, Debug)]
pub enum LotConfigError {
    #[error("failed to read lot config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lot config: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid classifier config: {0}")]
    Classifier(#[from] ClassifierConfigError),
    #[error("invalid aggregator config: {0}")]
    Aggregator(#[from] AggregatorConfigError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    pub id: RegionId,
    pub polygon: Vec<[i32; 2]>,
}

/// Which detections count as vehicles. `target_classes` has no default:
/// class ids depend on the detector's label map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    pub target_classes: Vec<u32>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

/// Calibration and tuning for one parking lot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LotConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub regions: Vec<RegionConfig>,
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// Everything needed to monitor one lot, built from a validated config.
pub struct LotPipeline {
    pub registry: RegionRegistry,
    pub classifier: OccupancyClassifier,
    pub aggregator: TemporalAggregator,
}

impl LotConfig {
    pub fn load(path: &Path) -> Result<Self, LotConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| LotConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, LotConfigError> {
        serde_json::from_str(raw).map_err(LotConfigError::Parse)
    }

    pub fn registry(&self) -> Result<RegionRegistry, LotConfigError> {
        let regions = self
            .regions
            .iter()
            .map(|r| Region::new(r.id, r.polygon.iter().map(|&[x, y]| (x, y)).collect()))
            .collect();
        Ok(RegionRegistry::new(regions)?)
    }

    pub fn classifier(&self) -> Result<OccupancyClassifier, LotConfigError> {
        let classes: HashSet<u32> = self.classifier.target_classes.iter().copied().collect();
        Ok(OccupancyClassifier::new(
            classes,
            self.classifier.min_confidence,
        )?)
    }

    /// Validates every section and assembles the lot's pipeline.
    pub fn build(&self) -> Result<LotPipeline, LotConfigError> {
        let registry = self.registry()?;
        let classifier = self.classifier()?;
        let aggregator = TemporalAggregator::from_config(&registry, &self.aggregator)?;
        Ok(LotPipeline {
            registry,
            classifier,
            aggregator,
        })
    }
}
