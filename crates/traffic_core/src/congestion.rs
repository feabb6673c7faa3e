//! Congestion classification: map observed vehicle density onto a
//! qualitative severity level.

use serde::{Deserialize, Serialize};

/// Density below which traffic is considered free-flowing.
pub const LOW_DENSITY_CEILING: f64 = 0.30;
/// Density below which traffic is moderate.
pub const MODERATE_DENSITY_CEILING: f64 = 0.60;
/// Density below which traffic is high; anything at or above is severe.
pub const HIGH_DENSITY_CEILING: f64 = 0.90;

/// Qualitative congestion severity, ordered from lightest to heaviest.
///
/// Serializes as the bare level name (`"Low"`, `"Moderate"`, ...), which is
/// the form the route report emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl CongestionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionLevel::Low => "Low",
            CongestionLevel::Moderate => "Moderate",
            CongestionLevel::High => "High",
            CongestionLevel::Severe => "Severe",
        }
    }
}

impl std::fmt::Display for CongestionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a vehicle count against a road capacity.
///
/// Density is `vehicle_count / road_capacity`:
///
/// - density < 0.30: [`CongestionLevel::Low`]
/// - density < 0.60: [`CongestionLevel::Moderate`]
/// - density < 0.90: [`CongestionLevel::High`]
/// - otherwise:      [`CongestionLevel::Severe`]
///
/// Counts above capacity are valid input and classify as severe. A zero
/// capacity has no meaningful density and is rejected.
pub fn classify(
    vehicle_count: u64,
    road_capacity: u64,
) -> Result<CongestionLevel, CongestionError> {
    if road_capacity == 0 {
        return Err(CongestionError::InvalidCapacity);
    }
    let density = vehicle_count as f64 / road_capacity as f64;
    let level = if density < LOW_DENSITY_CEILING {
        CongestionLevel::Low
    } else if density < MODERATE_DENSITY_CEILING {
        CongestionLevel::Moderate
    } else if density < HIGH_DENSITY_CEILING {
        CongestionLevel::High
    } else {
        CongestionLevel::Severe
    };
    Ok(level)
}

#[derive(Debug, PartialEq, Eq)]
pub enum CongestionError {
    /// Road capacity must be non-zero for density to be defined.
    InvalidCapacity,
}

impl std::fmt::Display for CongestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CongestionError::InvalidCapacity => write!(f, "road capacity must be greater than zero"),
        }
    }
}

impl std::error::Error for CongestionError {}
