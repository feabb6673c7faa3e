//! Density heatmap: aggregate a telemetry batch into per-cell distinct
//! entity counts.

use serde::Serialize;

use crate::grid::{GridError, GridIndexer};
use crate::telemetry::PositionSample;

/// One heatmap cell: the lower-left (south-west) corner of the grid cell
/// and the number of distinct entities observed in it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub lat: f64,
    pub lon: f64,
    pub density: u64,
}

/// Builds heatmaps at a fixed cell size.
#[derive(Clone, Copy, Debug)]
pub struct HeatmapService {
    indexer: GridIndexer,
}

impl HeatmapService {
    /// Create a service with the given cell size in degrees. The size must
    /// be finite and strictly positive.
    pub fn new(cell_size_deg: f64) -> Result<Self, GridError> {
        Ok(Self {
            indexer: GridIndexer::new(cell_size_deg)?,
        })
    }

    /// Aggregate samples into cells, ordered ascending by latitude bucket
    /// then longitude bucket. An empty batch yields an empty heatmap.
    pub fn build_heatmap(
        &self,
        samples: &[PositionSample],
    ) -> Result<Vec<HeatmapCell>, GridError> {
        let cells = self.indexer.bin(samples)?;
        let heatmap = cells
            .into_iter()
            .map(|(cell, entities)| {
                let origin = cell.origin(self.indexer.cell_size_deg());
                HeatmapCell {
                    lat: origin.lat,
                    lon: origin.lon,
                    density: entities.len() as u64,
                }
            })
            .collect();
        Ok(heatmap)
    }
}
