//! Forward geocoding: resolve free-text place names to coordinates.
//!
//! [`NominatimGeocoder`] queries a Nominatim `search` endpoint and caches
//! successful lookups per query string. [`StaticGeocoder`] resolves from a
//! fixed table so callers can run without network access. Both sit behind
//! [`Geocoder`].

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::geo::GeoPoint;

/// Public Nominatim endpoint.
pub const PUBLIC_NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Identifying User-Agent, required by the Nominatim usage policy.
const USER_AGENT: &str = concat!("traffic_core/", env!("CARGO_PKG_VERSION"));
const GEOCODE_CACHE_CAPACITY: usize = 256;

/// Trait for forward geocoders. Implementations must be `Send + Sync` so a
/// geocoder can be shared behind a service.
pub trait Geocoder: Send + Sync {
    /// Resolve a place name to a coordinate.
    fn geocode(&self, place_name: &str) -> Result<GeoPoint, GeocodeError>;
}

// ---------------------------------------------------------------------------
// Nominatim client
// ---------------------------------------------------------------------------

/// Geocodes via a Nominatim HTTP endpoint, keeping an LRU cache of
/// successful lookups keyed by the query string.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    cache: Mutex<LruCache<String, GeoPoint>>,
}

impl NominatimGeocoder {
    /// Create a client for the given Nominatim endpoint.
    pub fn new(endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(GEOCODE_CACHE_CAPACITY).expect("cache capacity must be > 0"),
            )),
        }
    }

    /// Client for the public endpoint.
    pub fn public() -> Self {
        Self::new(PUBLIC_NOMINATIM_ENDPOINT)
    }

    fn fetch(&self, place_name: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!("{}/search", self.endpoint);
        debug!("Geocoding '{}' via {}", place_name, url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", place_name), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(GeocodeError::Http)?;
        let results: Vec<NominatimResult> = response.json().map_err(GeocodeError::Json)?;
        parse_geocode_results(place_name, results)
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, place_name: &str) -> Result<GeoPoint, GeocodeError> {
        // Fast path: cache hit. A poisoned mutex falls through to an
        // uncached fetch.
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(point) = cache.get(place_name) {
                return Ok(*point);
            }
        }

        let point = self.fetch(place_name)?;

        // Only successful lookups are cached; failures retry next time.
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(place_name.to_string(), point);
        }
        Ok(point)
    }
}

/// Minimal Nominatim JSON result structure. Coordinates arrive as strings.
#[derive(Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

fn parse_geocode_results(
    place_name: &str,
    results: Vec<NominatimResult>,
) -> Result<GeoPoint, GeocodeError> {
    let Some(first) = results.into_iter().next() else {
        return Err(GeocodeError::NotFound(place_name.to_string()));
    };

    match (
        first.lat.trim().parse::<f64>(),
        first.lon.trim().parse::<f64>(),
    ) {
        (Ok(lat), Ok(lon)) => Ok(GeoPoint::new(lat, lon)),
        _ => Err(GeocodeError::Malformed(format!(
            "non-numeric coordinates '{},{}' for '{place_name}'",
            first.lat, first.lon
        ))),
    }
}

// ---------------------------------------------------------------------------
// Static geocoder
// ---------------------------------------------------------------------------

/// Geocoder resolving from a fixed in-memory table (useful for tests and
/// offline runs).
pub struct StaticGeocoder {
    places: HashMap<String, GeoPoint>,
}

impl StaticGeocoder {
    pub fn from_table(places: HashMap<String, GeoPoint>) -> Self {
        Self { places }
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, place_name: &str) -> Result<GeoPoint, GeocodeError> {
        self.places
            .get(place_name)
            .copied()
            .ok_or_else(|| GeocodeError::NotFound(place_name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by geocoders.
#[derive(Debug)]
pub enum GeocodeError {
    Http(reqwest::Error),
    Json(reqwest::Error),
    /// The service had no result for the place name.
    NotFound(String),
    /// The service answered with coordinates that did not parse.
    Malformed(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::Http(err) => write!(f, "geocoding request failed: {err}"),
            GeocodeError::Json(err) => write!(f, "invalid geocoding response: {err}"),
            GeocodeError::NotFound(place) => write!(f, "no coordinates found for '{place}'"),
            GeocodeError::Malformed(detail) => write!(f, "malformed geocoding response: {detail}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        GeocodeError::Http(err)
    }
}
