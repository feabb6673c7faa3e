//! Route congestion analysis: route a trip through a provider, count
//! distinct vehicles in a corridor around the returned path, and classify
//! the congestion level.
//!
//! The corridor is derived from the route itself (path bounding box plus
//! both endpoints, expanded by a configured margin), and the telemetry
//! batch is supplied per call. Nothing is read from ambient state.

use serde::Serialize;
use tracing::debug;

use crate::congestion::{self, CongestionError, CongestionLevel};
use crate::geo::{CorridorWindow, GeoPoint};
use crate::grid::{self, GridError};
use crate::routing::{RouteProvider, RouteProviderError};
use crate::telemetry::PositionSample;

/// Default nominal vehicle capacity of an analyzed corridor.
pub const DEFAULT_ROAD_CAPACITY: u64 = 100;
/// Default margin added around the route bounding box, in degrees.
pub const DEFAULT_CORRIDOR_MARGIN_DEG: f64 = 0.01;

// ---------------------------------------------------------------------------
// Configuration and report
// ---------------------------------------------------------------------------

/// Tunables for route analysis.
#[derive(Clone, Copy, Debug)]
pub struct RouteAnalysisConfig {
    /// Nominal vehicle capacity of the corridor; the density denominator.
    pub road_capacity: u64,
    /// Margin added around the route bounding box, in degrees.
    pub corridor_margin_deg: f64,
}

impl Default for RouteAnalysisConfig {
    fn default() -> Self {
        Self {
            road_capacity: DEFAULT_ROAD_CAPACITY,
            corridor_margin_deg: DEFAULT_CORRIDOR_MARGIN_DEG,
        }
    }
}

impl RouteAnalysisConfig {
    pub fn with_road_capacity(mut self, road_capacity: u64) -> Self {
        self.road_capacity = road_capacity;
        self
    }

    pub fn with_corridor_margin_deg(mut self, corridor_margin_deg: f64) -> Self {
        self.corridor_margin_deg = corridor_margin_deg;
        self
    }
}

/// Route analysis result, serialized in the shape downstream consumers
/// expect (camelCase coordinate keys included).
#[derive(Clone, Debug, Serialize)]
pub struct RouteReport {
    /// Waypoints as `[lat, lon]` pairs.
    pub path: Vec<[f64; 2]>,
    #[serde(rename = "startCoords")]
    pub start_coords: [f64; 2],
    #[serde(rename = "destinationCoords")]
    pub destination_coords: [f64; 2],
    /// Road distance in kilometres, rounded to two decimals.
    pub distance: f64,
    /// Travel time in minutes, rounded to two decimals.
    pub duration: f64,
    pub congestion: CongestionLevel,
    /// Distinct vehicles observed in the corridor.
    pub vehicle_count: u64,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Computes a [`RouteReport`] for a trip using an injected route provider.
pub struct RouteCongestionService {
    provider: Box<dyn RouteProvider>,
    config: RouteAnalysisConfig,
}

impl RouteCongestionService {
    /// Service with default configuration.
    pub fn new(provider: Box<dyn RouteProvider>) -> Self {
        Self {
            provider,
            config: RouteAnalysisConfig::default(),
        }
    }

    pub fn with_config(provider: Box<dyn RouteProvider>, config: RouteAnalysisConfig) -> Self {
        Self { provider, config }
    }

    /// Route from `start` to `end` and report congestion along the way.
    ///
    /// Both endpoints are validated before the provider is called, so an
    /// out-of-range request never reaches the network.
    pub fn compute_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        samples: &[PositionSample],
    ) -> Result<RouteReport, RouteCongestionError> {
        for point in [start, end] {
            if !point.is_valid() {
                return Err(RouteCongestionError::InvalidCoordinate {
                    latitude: point.lat,
                    longitude: point.lon,
                });
            }
        }

        let geometry = self.provider.route(start, end)?;
        let window = CorridorWindow::around_route(
            start,
            end,
            &geometry.path,
            self.config.corridor_margin_deg,
        );
        let count = grid::count_in_window(samples, &window)?;
        let vehicle_count = count.vehicle_count();
        let level = congestion::classify(vehicle_count, self.config.road_capacity)?;

        debug!(
            "Route {:.2} km in {:.2} min, average speed {:.1} km/h, {} vehicles in corridor",
            geometry.distance_km(),
            geometry.duration_min(),
            geometry.average_speed_kmh(),
            vehicle_count
        );

        Ok(RouteReport {
            path: geometry.path.iter().map(|p| [p.lat, p.lon]).collect(),
            start_coords: [start.lat, start.lon],
            destination_coords: [end.lat, end.lon],
            distance: round2(geometry.distance_km()),
            duration: round2(geometry.duration_min()),
            congestion: level,
            vehicle_count,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from route congestion analysis.
#[derive(Debug)]
pub enum RouteCongestionError {
    /// A requested endpoint is outside the valid coordinate ranges.
    InvalidCoordinate { latitude: f64, longitude: f64 },
    Provider(RouteProviderError),
    Telemetry(GridError),
    Congestion(CongestionError),
}

impl RouteCongestionError {
    /// Stable failure-kind tag, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteCongestionError::InvalidCoordinate { .. } => "invalid_coordinate",
            RouteCongestionError::Provider(_) => "route_provider",
            RouteCongestionError::Telemetry(_) => "telemetry",
            RouteCongestionError::Congestion(_) => "congestion",
        }
    }
}

impl std::fmt::Display for RouteCongestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteCongestionError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid coordinates ({latitude}, {longitude})"),
            RouteCongestionError::Provider(err) => write!(f, "{err}"),
            RouteCongestionError::Telemetry(err) => write!(f, "{err}"),
            RouteCongestionError::Congestion(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RouteCongestionError {}

impl From<RouteProviderError> for RouteCongestionError {
    fn from(err: RouteProviderError) -> Self {
        RouteCongestionError::Provider(err)
    }
}

impl From<GridError> for RouteCongestionError {
    fn from(err: GridError) -> Self {
        RouteCongestionError::Telemetry(err)
    }
}

impl From<CongestionError> for RouteCongestionError {
    fn from(err: CongestionError) -> Self {
        RouteCongestionError::Congestion(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{FixedRouteProvider, RouteGeometry};
    use crate::telemetry::PositionSample;

    struct FailingProvider;

    impl RouteProvider for FailingProvider {
        fn route(
            &self,
            _start: GeoPoint,
            _end: GeoPoint,
        ) -> Result<RouteGeometry, RouteProviderError> {
            Err(RouteProviderError::Api("InvalidQuery".to_string()))
        }
    }

    fn fixed_provider() -> Box<dyn RouteProvider> {
        Box::new(FixedRouteProvider::new(RouteGeometry {
            path: vec![
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
            ],
            distance_m: 5821.3,
            duration_s: 612.8,
        }))
    }

    fn sample(id: &str, lat: f64, lon: f64) -> PositionSample {
        PositionSample::new(id, lat, lon, "2024-01-01T00:00:00Z")
    }

    fn corridor_samples() -> Vec<PositionSample> {
        vec![
            sample("v1", 12.9716, 77.5946),
            sample("v1", 12.9720, 77.5950),
            sample("v2", 12.9716, 77.5946),
        ]
    }

    #[test]
    fn reports_route_with_distinct_vehicle_count() {
        let service = RouteCongestionService::new(fixed_provider());
        let report = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &corridor_samples(),
            )
            .unwrap();

        assert_eq!(report.vehicle_count, 2);
        assert_eq!(report.congestion, CongestionLevel::Low);
        assert_eq!(report.distance, 5.82);
        assert_eq!(report.duration, 10.21);
        assert_eq!(report.start_coords, [12.9716, 77.5946]);
        assert_eq!(report.destination_coords, [12.9720, 77.5950]);
        assert_eq!(report.path.len(), 2);
        assert_eq!(report.path[0], [12.9716, 77.5946]);
    }

    #[test]
    fn validates_endpoints_before_calling_the_provider() {
        // The failing provider would return an Api error; the invalid
        // latitude must win.
        let service = RouteCongestionService::new(Box::new(FailingProvider));
        let err = service
            .compute_route(
                GeoPoint::new(95.0, 77.59),
                GeoPoint::new(12.9720, 77.5950),
                &[],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_coordinate");
        assert!(matches!(
            err,
            RouteCongestionError::InvalidCoordinate { latitude, .. } if latitude == 95.0
        ));
    }

    #[test]
    fn provider_failures_surface_as_provider_errors() {
        let service = RouteCongestionService::new(Box::new(FailingProvider));
        let err = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &[],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "route_provider");
    }

    #[test]
    fn empty_path_still_counts_the_trip_corridor() {
        // Degenerate geometry: no waypoints, zero duration. The corridor
        // falls back to the endpoints plus margin and the report keeps a
        // zero duration rather than failing on speed.
        let provider = Box::new(FixedRouteProvider::new(RouteGeometry {
            path: Vec::new(),
            distance_m: 0.0,
            duration_s: 0.0,
        }));
        let service = RouteCongestionService::new(provider);
        let report = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9716, 77.5946),
                &[sample("v1", 12.9716, 77.5946)],
            )
            .unwrap();
        assert_eq!(report.vehicle_count, 1);
        assert_eq!(report.distance, 0.0);
        assert_eq!(report.duration, 0.0);
        assert_eq!(report.congestion, CongestionLevel::Low);
    }

    #[test]
    fn classification_uses_the_configured_capacity() {
        let config = RouteAnalysisConfig::default().with_road_capacity(10);
        let service = RouteCongestionService::with_config(fixed_provider(), config);
        // 3 distinct vehicles over capacity 10 is density 0.3: Moderate.
        let samples = vec![
            sample("v1", 12.9716, 77.5946),
            sample("v2", 12.9717, 77.5947),
            sample("v3", 12.9718, 77.5948),
        ];
        let report = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &samples,
            )
            .unwrap();
        assert_eq!(report.congestion, CongestionLevel::Moderate);
    }

    #[test]
    fn severe_congestion_at_high_density() {
        let service = RouteCongestionService::new(fixed_provider());
        let samples: Vec<PositionSample> = (0..95)
            .map(|i| sample(&format!("v{i}"), 12.9716, 77.5946))
            .collect();
        let report = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &samples,
            )
            .unwrap();
        assert_eq!(report.vehicle_count, 95);
        assert_eq!(report.congestion, CongestionLevel::Severe);
    }

    #[test]
    fn zero_capacity_is_a_congestion_error() {
        let config = RouteAnalysisConfig::default().with_road_capacity(0);
        let service = RouteCongestionService::with_config(fixed_provider(), config);
        let err = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &[],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "congestion");
    }

    #[test]
    fn out_of_range_samples_are_telemetry_errors() {
        let service = RouteCongestionService::new(fixed_provider());
        let err = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &[sample("v1", 12.9716, 200.0)],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "telemetry");
    }

    #[test]
    fn report_serializes_with_camel_case_coordinate_keys() {
        let service = RouteCongestionService::new(fixed_provider());
        let report = service
            .compute_route(
                GeoPoint::new(12.9716, 77.5946),
                GeoPoint::new(12.9720, 77.5950),
                &corridor_samples(),
            )
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("startCoords").is_some());
        assert!(json.get("destinationCoords").is_some());
        assert_eq!(json["congestion"], "Low");
        assert_eq!(json["vehicle_count"], 2);
        assert_eq!(json["distance"], 5.82);
    }
}
