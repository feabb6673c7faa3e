//! Uniform spatial grid: floor-division bucketing of position samples and
//! distinct-entity counting.
//!
//! Cells are identified by integer bucket pairs `(floor(lat / cell_size),
//! floor(lon / cell_size))`. Floor division keeps southern/western
//! hemisphere coordinates in their own buckets instead of collapsing the
//! band around zero. Per-cell density is the number of distinct entities,
//! not raw samples, so a vehicle reporting twice from the same cell counts
//! once.

use std::collections::{BTreeMap, HashSet};

use crate::geo::{CorridorWindow, GeoPoint};
use crate::telemetry::PositionSample;

/// Default cell edge length in degrees (~1.1 km of latitude).
pub const DEFAULT_CELL_SIZE_DEG: f64 = 0.01;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Identifier of one grid cell. `Ord` is lexicographic by latitude bucket
/// then longitude bucket, which fixes the iteration order of binned maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub lat_bucket: i64,
    pub lon_bucket: i64,
}

impl GridCell {
    /// Lower-left (south-west) corner of this cell.
    pub fn origin(&self, cell_size_deg: f64) -> GeoPoint {
        GeoPoint::new(
            self.lat_bucket as f64 * cell_size_deg,
            self.lon_bucket as f64 * cell_size_deg,
        )
    }
}

// ---------------------------------------------------------------------------
// Indexer
// ---------------------------------------------------------------------------

/// Buckets samples into a uniform grid with a fixed cell size.
#[derive(Clone, Copy, Debug)]
pub struct GridIndexer {
    cell_size_deg: f64,
}

impl GridIndexer {
    /// Create an indexer. The cell size must be finite and strictly
    /// positive.
    pub fn new(cell_size_deg: f64) -> Result<Self, GridError> {
        if !cell_size_deg.is_finite() || cell_size_deg <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size_deg));
        }
        Ok(Self { cell_size_deg })
    }

    pub fn cell_size_deg(&self) -> f64 {
        self.cell_size_deg
    }

    /// Cell containing `point`.
    pub fn cell_for(&self, point: GeoPoint) -> GridCell {
        GridCell {
            lat_bucket: (point.lat / self.cell_size_deg).floor() as i64,
            lon_bucket: (point.lon / self.cell_size_deg).floor() as i64,
        }
    }

    /// Bucket every sample, deduplicating entity ids per cell.
    ///
    /// Fails on the first sample with out-of-range coordinates; an empty
    /// batch yields an empty map.
    pub fn bin(
        &self,
        samples: &[PositionSample],
    ) -> Result<BTreeMap<GridCell, HashSet<String>>, GridError> {
        let mut cells: BTreeMap<GridCell, HashSet<String>> = BTreeMap::new();
        for sample in samples {
            let cell = self.cell_for(validated(sample)?);
            cells
                .entry(cell)
                .or_default()
                .insert(sample.entity_id.clone());
        }
        Ok(cells)
    }
}

// ---------------------------------------------------------------------------
// Window counting
// ---------------------------------------------------------------------------

/// Distinct entities observed inside a corridor window.
#[derive(Clone, Debug, Default)]
pub struct WindowCount {
    entities: HashSet<String>,
}

impl WindowCount {
    pub fn vehicle_count(&self) -> u64 {
        self.entities.len() as u64
    }

    pub fn entities(&self) -> &HashSet<String> {
        &self.entities
    }
}

/// Count distinct entities whose samples fall inside `window` (inclusive
/// edges). Every sample in the batch is range-checked, inside the window or
/// not.
pub fn count_in_window(
    samples: &[PositionSample],
    window: &CorridorWindow,
) -> Result<WindowCount, GridError> {
    let mut entities = HashSet::new();
    for sample in samples {
        let point = validated(sample)?;
        if window.contains(point) {
            entities.insert(sample.entity_id.clone());
        }
    }
    Ok(WindowCount { entities })
}

fn validated(sample: &PositionSample) -> Result<GeoPoint, GridError> {
    let point = sample.position();
    if !point.is_valid() {
        return Err(GridError::InvalidSample {
            entity_id: sample.entity_id.clone(),
            latitude: sample.latitude,
            longitude: sample.longitude,
        });
    }
    Ok(point)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum GridError {
    /// Cell size was zero, negative, or non-finite.
    InvalidCellSize(f64),
    /// A sample carried coordinates outside the valid lat/lon ranges.
    InvalidSample {
        entity_id: String,
        latitude: f64,
        longitude: f64,
    },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::InvalidCellSize(size) => {
                write!(f, "grid cell size must be positive and finite, got {size}")
            }
            GridError::InvalidSample {
                entity_id,
                latitude,
                longitude,
            } => write!(
                f,
                "sample '{entity_id}' has out-of-range coordinates ({latitude}, {longitude})"
            ),
        }
    }
}

impl std::error::Error for GridError {}
