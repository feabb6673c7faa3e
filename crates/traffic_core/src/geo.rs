//! Geographic primitives: coordinate points, great-circle distance, and
//! inclusive bounding-box windows.
//!
//! All distances use the haversine formula on a spherical Earth model
//! (mean radius 6371 km). Ellipsoidal corrections are out of scope; the
//! consumers of these distances (density bucketing, radius matching)
//! tolerate the sub-0.5% spherical error.

/// Mean Earth radius in kilometres (spherical model).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// ---------------------------------------------------------------------------
// Points and validation
// ---------------------------------------------------------------------------

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both components are finite and inside the valid ranges
    /// (|lat| <= 90, |lon| <= 180). NaN fails both comparisons, so it is
    /// rejected as well.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lon.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lon.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

// ---------------------------------------------------------------------------
// Corridor windows
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box with inclusive edges.
///
/// Used as the counting corridor around a route: a sample sitting exactly
/// on a boundary belongs to the window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorridorWindow {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl CorridorWindow {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Window spanning a route: the bounding box of the path plus both
    /// endpoints, expanded by `margin_deg` on every side.
    ///
    /// The endpoints are always folded in, so an empty path still yields a
    /// window covering the requested trip.
    pub fn around_route(
        start: GeoPoint,
        end: GeoPoint,
        path: &[GeoPoint],
        margin_deg: f64,
    ) -> Self {
        let mut min_lat = start.lat.min(end.lat);
        let mut max_lat = start.lat.max(end.lat);
        let mut min_lon = start.lon.min(end.lon);
        let mut max_lon = start.lon.max(end.lon);
        for p in path {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
        }
        Self {
            min_lat: min_lat - margin_deg,
            max_lat: max_lat + margin_deg,
            min_lon: min_lon - margin_deg,
            max_lon: max_lon + margin_deg,
        }
    }

    /// Inclusive membership test: boundary points count as inside.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = GeoPoint::new(12.9716, 77.5946);
        assert_eq!(haversine_km(p, p), 0.0);
    }

    #[test]
    fn haversine_one_hundredth_degree_latitude() {
        // 0.01 degrees of latitude is ~1.11 km regardless of longitude.
        let a = GeoPoint::new(12.97, 77.59);
        let b = GeoPoint::new(12.98, 77.59);
        let d = haversine_km(a, b);
        assert!((d - 1.112).abs() < 0.01, "got {d}");
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = GeoPoint::new(28.6304, 77.2177);
        let b = GeoPoint::new(28.7041, 77.1025);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn validity_accepts_range_boundaries() {
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(GeoPoint::new(-90.0, -180.0).is_valid());
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
    }

    #[test]
    fn validity_rejects_out_of_range_and_nan() {
        assert!(!GeoPoint::new(90.0001, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.0001).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn window_contains_is_inclusive_on_boundaries() {
        let w = CorridorWindow::new(12.9710, 12.9730, 77.5940, 77.5960);
        assert!(w.contains(GeoPoint::new(12.9710, 77.5940)));
        assert!(w.contains(GeoPoint::new(12.9730, 77.5960)));
        assert!(w.contains(GeoPoint::new(12.9720, 77.5950)));
        assert!(!w.contains(GeoPoint::new(12.9709, 77.5950)));
        assert!(!w.contains(GeoPoint::new(12.9720, 77.5961)));
    }

    #[test]
    fn route_window_covers_endpoints_without_path() {
        let start = GeoPoint::new(12.97, 77.59);
        let end = GeoPoint::new(12.99, 77.61);
        let w = CorridorWindow::around_route(start, end, &[], 0.01);
        assert!(w.contains(start));
        assert!(w.contains(end));
        assert_eq!(w.min_lat, 12.96);
        assert_eq!(w.max_lon, 77.62);
    }

    #[test]
    fn route_window_expands_to_path_extremes() {
        let start = GeoPoint::new(12.97, 77.59);
        let end = GeoPoint::new(12.98, 77.60);
        // Detour dips south of both endpoints.
        let path = [
            GeoPoint::new(12.95, 77.59),
            GeoPoint::new(12.96, 77.62),
        ];
        let w = CorridorWindow::around_route(start, end, &path, 0.0);
        assert_eq!(w.min_lat, 12.95);
        assert_eq!(w.max_lon, 77.62);
        assert!(w.contains(GeoPoint::new(12.95, 77.60)));
    }
}
