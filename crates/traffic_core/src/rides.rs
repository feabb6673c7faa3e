//! Ride offers: the persisted CSV dataset and a seeded synthetic generator.
//!
//! The canonical CSV schema is
//! `user_id,pickup_lat,pickup_long,dropoff_lat,dropoff_long,request_time,available_seats,ride_status,carpooling_preference`
//! with the carpooling flag encoded as `Yes`/`No`. The dataset is loaded
//! once into an immutable [`RideDataset`] and passed by reference; nothing
//! here keeps global state.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Lifecycle state of a ride offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RideStatus {
    Completed,
    Ongoing,
    Cancelled,
}

/// One row of the ride dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RideOffer {
    pub user_id: String,
    pub pickup_lat: f64,
    pub pickup_long: f64,
    pub dropoff_lat: f64,
    pub dropoff_long: f64,
    /// Opaque request timestamp; carried through, never interpreted.
    pub request_time: String,
    pub available_seats: u32,
    pub ride_status: RideStatus,
    #[serde(with = "yes_no")]
    pub carpooling_preference: bool,
}

impl RideOffer {
    pub fn pickup(&self) -> GeoPoint {
        GeoPoint::new(self.pickup_lat, self.pickup_long)
    }

    pub fn dropoff(&self) -> GeoPoint {
        GeoPoint::new(self.dropoff_lat, self.dropoff_long)
    }
}

/// Serde helper: the CSV schema encodes the carpooling flag as `Yes`/`No`.
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(de)?;
        match raw.trim() {
            "Yes" => Ok(true),
            "No" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "carpooling_preference must be Yes or No, got '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset handle
// ---------------------------------------------------------------------------

/// Immutable handle over a loaded set of ride offers, in file order.
#[derive(Clone, Debug, Default)]
pub struct RideDataset {
    offers: Vec<RideOffer>,
}

impl RideDataset {
    pub fn from_offers(offers: Vec<RideOffer>) -> Self {
        Self { offers }
    }

    /// Load from a CSV file with the canonical header row.
    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut offers = Vec::new();
        for record in csv_reader.deserialize() {
            offers.push(record?);
        }
        Ok(Self { offers })
    }

    pub fn offers(&self) -> &[RideOffer] {
        &self.offers
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Write offers as canonical CSV (header row included).
pub fn write_csv<W: io::Write>(offers: &[RideOffer], writer: W) -> Result<(), DatasetError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for offer in offers {
        wtr.serialize(offer)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_path(offers: &[RideOffer], path: &Path) -> Result<(), DatasetError> {
    let file = fs::File::create(path)?;
    write_csv(offers, file)
}

// ---------------------------------------------------------------------------
// Synthetic generation
// ---------------------------------------------------------------------------

/// Default bounding box: Delhi region (approx).
const DEFAULT_LAT_MIN: f64 = 28.50;
const DEFAULT_LAT_MAX: f64 = 28.80;
const DEFAULT_LON_MIN: f64 = 77.00;
const DEFAULT_LON_MAX: f64 = 77.30;

/// Parameters for generating a synthetic ride dataset.
#[derive(Clone, Debug)]
pub struct DatasetSpec {
    pub num_rides: usize,
    /// Random seed for reproducibility (optional; if None, seeds from entropy).
    pub seed: Option<u64>,
    /// Bounding box for pickup and dropoff coordinates (degrees).
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        Self {
            num_rides: 1000,
            seed: None,
            lat_min: DEFAULT_LAT_MIN,
            lat_max: DEFAULT_LAT_MAX,
            lon_min: DEFAULT_LON_MIN,
            lon_max: DEFAULT_LON_MAX,
        }
    }
}

impl DatasetSpec {
    pub fn with_num_rides(mut self, num_rides: usize) -> Self {
        self.num_rides = num_rides;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Generate offers with uniformly random positions inside the spec's
/// bounding box, seats 1 to 4, and request times in the current month.
pub fn generate_offers(spec: &DatasetSpec) -> Vec<RideOffer> {
    let mut rng = match spec.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let now = Utc::now();
    let statuses = [
        RideStatus::Completed,
        RideStatus::Ongoing,
        RideStatus::Cancelled,
    ];

    (0..spec.num_rides)
        .map(|_| {
            let (pickup_lat, pickup_long) = random_coordinates(&mut rng, spec);
            let (dropoff_lat, dropoff_long) = random_coordinates(&mut rng, spec);
            RideOffer {
                user_id: random_uuid(&mut rng),
                pickup_lat,
                pickup_long,
                dropoff_lat,
                dropoff_long,
                request_time: random_request_time(&mut rng, now.year(), now.month()),
                available_seats: rng.gen_range(1..=4),
                ride_status: statuses[rng.gen_range(0..statuses.len())],
                carpooling_preference: rng.gen_bool(0.5),
            }
        })
        .collect()
}

fn random_coordinates(rng: &mut StdRng, spec: &DatasetSpec) -> (f64, f64) {
    let lat = rng.gen_range(spec.lat_min..spec.lat_max);
    let lon = rng.gen_range(spec.lon_min..spec.lon_max);
    (round6(lat), round6(lon))
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// RFC 4122 v4 id drawn from the caller's rng, so seeded runs reproduce.
fn random_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

/// `YYYY-MM-DD HH:MM:SS` within the given month. Day is capped at 28 so
/// every month is valid.
fn random_request_time(rng: &mut StdRng, year: i32, month: u32) -> String {
    format!(
        "{year:04}-{month:02}-{:02} {:02}:{:02}:{:02}",
        rng.gen_range(1..=28),
        rng.gen_range(0..24),
        rng.gen_range(0..60),
        rng.gen_range(0..60),
    )
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors encountered while loading or writing a ride dataset.
#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "failed to open ride dataset: {err}"),
            DatasetError::Csv(err) => write!(f, "invalid ride dataset: {err}"),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err)
    }
}

impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        DatasetError::Csv(err)
    }
}
