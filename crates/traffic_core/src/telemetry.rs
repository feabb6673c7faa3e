//! Vehicle position telemetry: the immutable sample record and tolerant
//! batch-file parsing.
//!
//! Batches arrive as JSON arrays of objects. Upstream recorders disagree on
//! field shapes, so the parser accepts:
//!
//! - `latitude`/`longitude` as JSON numbers or numeric strings
//! - the entity key as `entity_id` or `vehicle_id`
//! - missing entity ids (each such record gets a unique synthetic id, so it
//!   counts as its own entity downstream)
//! - extra fields, which are ignored
//!
//! Coordinate range checking is not done here; the grid operations validate
//! samples when they consume them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::geo::GeoPoint;

// ---------------------------------------------------------------------------
// Sample record
// ---------------------------------------------------------------------------

/// One recorded vehicle position. Immutable once parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionSample {
    /// Stable identifier of the reporting vehicle.
    pub entity_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Opaque recorder timestamp; carried through, never interpreted.
    pub timestamp: String,
}

impl PositionSample {
    pub fn new(entity_id: &str, latitude: f64, longitude: f64, timestamp: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            latitude,
            longitude,
            timestamp: timestamp.to_string(),
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Batch parsing
// ---------------------------------------------------------------------------

/// Wire shape of one batch record. Only `latitude`/`longitude` are required.
#[derive(Deserialize)]
struct RawPositionRecord {
    #[serde(default, alias = "vehicle_id")]
    entity_id: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    latitude: f64,
    #[serde(deserialize_with = "lenient_f64")]
    longitude: f64,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Accept a coordinate encoded either as a JSON number or a numeric string.
fn lenient_f64<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match NumberOrString::deserialize(de)? {
        NumberOrString::Number(v) => Ok(v),
        NumberOrString::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Parse a JSON batch into samples.
///
/// Records without an entity id are assigned `sample-<index>` so each one
/// counts as a distinct entity.
pub fn parse_samples(json: &str) -> Result<Vec<PositionSample>, TelemetryError> {
    let raw: Vec<RawPositionRecord> = serde_json::from_str(json)?;
    let samples = raw
        .into_iter()
        .enumerate()
        .map(|(idx, record)| PositionSample {
            entity_id: record.entity_id.unwrap_or_else(|| format!("sample-{idx}")),
            latitude: record.latitude,
            longitude: record.longitude,
            timestamp: record.timestamp.unwrap_or_default(),
        })
        .collect();
    Ok(samples)
}

/// Read and parse a batch file.
pub fn load_samples(path: &Path) -> Result<Vec<PositionSample>, TelemetryError> {
    let json = fs::read_to_string(path)?;
    parse_samples(&json)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors encountered while loading a telemetry batch.
#[derive(Debug)]
pub enum TelemetryError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::Io(err) => write!(f, "failed to read telemetry batch: {err}"),
            TelemetryError::Json(err) => write!(f, "invalid telemetry batch: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Io(err)
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Json(err)
    }
}
