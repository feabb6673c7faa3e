//! Pluggable route-geometry providers: trait abstraction over routing
//! backends plus the OSRM HTTP implementation.
//!
//! Route computation itself is delegated. [`OsrmRouteProvider`] talks to an
//! OSRM `route/v1/driving` endpoint; [`FixedRouteProvider`] returns a preset
//! geometry for offline runs and tests. Both sit behind [`RouteProvider`],
//! which is what the services hold.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::geo::GeoPoint;

/// Public OSRM demo endpoint.
pub const PUBLIC_OSRM_ENDPOINT: &str = "http://router.project-osrm.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Route geometry and totals returned by a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteGeometry {
    /// Waypoints along the road in (lat, lon) order.
    pub path: Vec<GeoPoint>,
    /// Road-network distance in metres.
    pub distance_m: f64,
    /// Travel time in seconds.
    pub duration_s: f64,
}

impl RouteGeometry {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_s / 60.0
    }

    /// Average speed over the route, zero when the duration is zero or
    /// negative. Degenerate same-point routes therefore read as 0 km/h
    /// instead of failing.
    pub fn average_speed_kmh(&self) -> f64 {
        if self.duration_s <= 0.0 {
            return 0.0;
        }
        self.distance_km() / (self.duration_s / 3600.0)
    }
}

/// Trait for routing backends. Implementations must be `Send + Sync` so a
/// provider can be shared behind a service.
pub trait RouteProvider: Send + Sync {
    /// Compute a driving route between two coordinates.
    fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteGeometry, RouteProviderError>;
}

// ---------------------------------------------------------------------------
// OSRM provider
// ---------------------------------------------------------------------------

/// Routes via an OSRM HTTP endpoint.
pub struct OsrmRouteProvider {
    client: Client,
    endpoint: String,
}

impl OsrmRouteProvider {
    /// Create a client for the given OSRM endpoint (e.g. `http://localhost:5000`).
    pub fn new(endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Client for the public demo endpoint.
    pub fn public() -> Self {
        Self::new(PUBLIC_OSRM_ENDPOINT)
    }
}

/// Minimal OSRM JSON response structures.
#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64, // metres
    duration: f64, // seconds
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat]
}

impl RouteProvider for OsrmRouteProvider {
    fn route(&self, start: GeoPoint, end: GeoPoint) -> Result<RouteGeometry, RouteProviderError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.endpoint, start.lon, start.lat, end.lon, end.lat,
        );
        debug!("Requesting route: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(RouteProviderError::Http)?;
        let parsed: OsrmResponse = response.json().map_err(RouteProviderError::Json)?;
        parse_route_response(parsed)
    }
}

fn parse_route_response(resp: OsrmResponse) -> Result<RouteGeometry, RouteProviderError> {
    if resp.code != "Ok" {
        return Err(RouteProviderError::Api(resp.code));
    }

    let route = resp
        .routes
        .and_then(|routes| routes.into_iter().next())
        .ok_or(RouteProviderError::NoRoute)?;

    let path = route
        .geometry
        .coordinates
        .iter()
        .map(|&[lng, lat]| GeoPoint::new(lat, lng)) // OSRM returns [lng, lat]
        .collect();

    Ok(RouteGeometry {
        path,
        distance_m: route.distance,
        duration_s: route.duration,
    })
}

// ---------------------------------------------------------------------------
// Fixed provider
// ---------------------------------------------------------------------------

/// Provider returning one preset geometry regardless of the endpoints
/// (useful for tests and offline runs).
pub struct FixedRouteProvider {
    geometry: RouteGeometry,
}

impl FixedRouteProvider {
    pub fn new(geometry: RouteGeometry) -> Self {
        Self { geometry }
    }
}

impl RouteProvider for FixedRouteProvider {
    fn route(&self, _start: GeoPoint, _end: GeoPoint) -> Result<RouteGeometry, RouteProviderError> {
        Ok(self.geometry.clone())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by route providers.
#[derive(Debug)]
pub enum RouteProviderError {
    Http(reqwest::Error),
    Json(reqwest::Error),
    /// The routing service answered with a non-Ok code.
    Api(String),
    /// The response contained no route between the endpoints.
    NoRoute,
}

impl std::fmt::Display for RouteProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteProviderError::Http(err) => write!(f, "route request failed: {err}"),
            RouteProviderError::Json(err) => write!(f, "invalid route response: {err}"),
            RouteProviderError::Api(code) => write!(f, "routing service returned code '{code}'"),
            RouteProviderError::NoRoute => write!(f, "no route found between the given points"),
        }
    }
}

impl std::error::Error for RouteProviderError {}

impl From<reqwest::Error> for RouteProviderError {
    fn from(err: reqwest::Error) -> Self {
        RouteProviderError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ok_response_and_flips_coordinates() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 5821.3,
                "duration": 612.8,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[77.5946, 12.9716], [77.5950, 12.9720]]
                }
            }],
            "waypoints": []
        }"#;
        let resp: OsrmResponse = serde_json::from_str(json).unwrap();
        let geometry = parse_route_response(resp).unwrap();
        assert_eq!(geometry.path[0], GeoPoint::new(12.9716, 77.5946));
        assert_eq!(geometry.path[1], GeoPoint::new(12.9720, 77.5950));
        assert_eq!(geometry.distance_m, 5821.3);
        assert_eq!(geometry.duration_s, 612.8);
    }

    #[test]
    fn non_ok_code_is_an_api_error() {
        let resp = OsrmResponse {
            code: "NoSegment".to_string(),
            routes: None,
        };
        let err = parse_route_response(resp).unwrap_err();
        assert!(matches!(err, RouteProviderError::Api(code) if code == "NoSegment"));
    }

    #[test]
    fn missing_or_empty_routes_is_no_route() {
        let resp = OsrmResponse {
            code: "Ok".to_string(),
            routes: None,
        };
        assert!(matches!(
            parse_route_response(resp),
            Err(RouteProviderError::NoRoute)
        ));

        let resp = OsrmResponse {
            code: "Ok".to_string(),
            routes: Some(Vec::new()),
        };
        assert!(matches!(
            parse_route_response(resp),
            Err(RouteProviderError::NoRoute)
        ));
    }

    #[test]
    fn unit_conversions() {
        let geometry = RouteGeometry {
            path: Vec::new(),
            distance_m: 10_000.0,
            duration_s: 600.0,
        };
        assert_eq!(geometry.distance_km(), 10.0);
        assert_eq!(geometry.duration_min(), 10.0);
        assert_eq!(geometry.average_speed_kmh(), 60.0);
    }

    #[test]
    fn zero_duration_yields_zero_speed() {
        let geometry = RouteGeometry {
            path: Vec::new(),
            distance_m: 1_000.0,
            duration_s: 0.0,
        };
        assert_eq!(geometry.average_speed_kmh(), 0.0);
    }

    #[test]
    fn fixed_provider_echoes_its_geometry() {
        let geometry = RouteGeometry {
            path: vec![GeoPoint::new(12.97, 77.59)],
            distance_m: 1200.0,
            duration_s: 180.0,
        };
        let provider = FixedRouteProvider::new(geometry.clone());
        let routed = provider
            .route(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0))
            .unwrap();
        assert_eq!(routed, geometry);
    }
}
