use std::collections::HashMap;

use thiserror::Error;

use crate::occupancy::domain::region::{Region, RegionId};
use crate::shared::constants::MIN_POLYGON_VERTICES;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("region {0} not found")]
    NotFound(RegionId),
    #[error("invalid region configuration: {0}")]
    InvalidConfiguration(String),
}

/// Immutable catalog of parking slots, kept in calibration order.
///
/// Registry order is significant: when a reference point falls inside
/// overlapping polygons, the earlier region wins.
#[derive(Clone, Debug)]
pub struct RegionRegistry {
    regions: Vec<Region>,
    positions: HashMap<RegionId, usize>,
}

impl RegionRegistry {
    /// Validates and freezes the region set.
    ///
    /// Rejects an empty set, duplicate ids, polygons with fewer than three
    /// vertices, zero-area polygons and self-intersecting polygons.
    pub fn new(regions: Vec<Region>) -> Result<Self, RegistryError> {
        if regions.is_empty() {
            return Err(RegistryError::InvalidConfiguration(
                "at least one region is required".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(regions.len());
        for (position, region) in regions.iter().enumerate() {
            validate_region(region)?;
            if positions.insert(region.id, position).is_some() {
                return Err(RegistryError::InvalidConfiguration(format!(
                    "duplicate region id {}",
                    region.id
                )));
            }
        }

        Ok(Self { regions, positions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region_by_id(&self, id: RegionId) -> Result<&Region, RegistryError> {
        self.positions
            .get(&id)
            .map(|&position| &self.regions[position])
            .ok_or(RegistryError::NotFound(id))
    }

    /// Index of a region in registry order.
    pub fn position(&self, id: RegionId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn validate_region(region: &Region) -> Result<(), RegistryError> {
    let polygon = &region.polygon;
    if polygon.len() < MIN_POLYGON_VERTICES {
        return Err(RegistryError::InvalidConfiguration(format!(
            "region {} has {} vertices, need at least {MIN_POLYGON_VERTICES}",
            region.id,
            polygon.len()
        )));
    }
    if polygon.signed_area() == 0.0 {
        return Err(RegistryError::InvalidConfiguration(format!(
            "region {} polygon has zero area",
            region.id
        )));
    }
    if !polygon.is_simple() {
        return Err(RegistryError::InvalidConfiguration(format!(
            "region {} polygon is self-intersecting",
            region.id
        )));
    }
    Ok(())
}
