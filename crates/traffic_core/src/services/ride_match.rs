//! Ride matching: geocode a place name once, then filter the ride dataset
//! by pickup proximity and carpooling opt-in.

use crate::geocode::{GeocodeError, Geocoder};
use crate::matching::{LinearScanMatcher, MatchError, ProximityMatcher};
use crate::rides::{RideDataset, RideOffer};

/// Default match radius in kilometres.
pub const DEFAULT_MATCH_RADIUS_KM: f64 = 2.0;

/// A ride-match request: free-text place plus a radius.
#[derive(Clone, Debug)]
pub struct MatchQuery {
    pub place_name: String,
    pub max_distance_km: f64,
}

impl MatchQuery {
    /// Query with the default radius.
    pub fn new(place_name: &str) -> Self {
        Self {
            place_name: place_name.to_string(),
            max_distance_km: DEFAULT_MATCH_RADIUS_KM,
        }
    }

    pub fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }
}

/// Matches ride offers near a named place.
pub struct RideMatchService {
    geocoder: Box<dyn Geocoder>,
    matcher: Box<dyn ProximityMatcher>,
}

impl RideMatchService {
    /// Service with the linear-scan matcher.
    pub fn new(geocoder: Box<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            matcher: Box::new(LinearScanMatcher),
        }
    }

    pub fn with_matcher(
        geocoder: Box<dyn Geocoder>,
        matcher: Box<dyn ProximityMatcher>,
    ) -> Self {
        Self { geocoder, matcher }
    }

    /// Resolve the query's place name, then return the offers whose pickup
    /// lies within the radius and whose owner opted into carpooling.
    /// Results keep dataset order.
    pub fn find_matches(
        &self,
        query: &MatchQuery,
        dataset: &RideDataset,
    ) -> Result<Vec<RideOffer>, RideMatchError> {
        let origin = self.geocoder.geocode(&query.place_name)?;
        let matches = self.matcher.matches_within(
            origin,
            dataset.offers(),
            query.max_distance_km,
            &|offer| offer.carpooling_preference,
        )?;
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from ride matching.
#[derive(Debug)]
pub enum RideMatchError {
    Geocode(GeocodeError),
    Match(MatchError),
}

impl RideMatchError {
    /// Stable failure-kind tag, independent of the message text.
    pub fn kind(&self) -> &'static str {
        match self {
            RideMatchError::Geocode(_) => "geocode",
            RideMatchError::Match(_) => "match",
        }
    }
}

impl std::fmt::Display for RideMatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RideMatchError::Geocode(err) => write!(f, "{err}"),
            RideMatchError::Match(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RideMatchError {}

impl From<GeocodeError> for RideMatchError {
    fn from(err: GeocodeError) -> Self {
        RideMatchError::Geocode(err)
    }
}

impl From<MatchError> for RideMatchError {
    fn from(err: MatchError) -> Self {
        RideMatchError::Match(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::geocode::StaticGeocoder;
    use crate::rides::RideStatus;
    use std::collections::HashMap;

    const PLACE: &str = "Connaught Place, Delhi";
    const PLACE_COORDS: GeoPoint = GeoPoint {
        lat: 28.6304,
        lon: 77.2177,
    };

    fn geocoder() -> Box<dyn Geocoder> {
        Box::new(StaticGeocoder::from_table(HashMap::from([(
            PLACE.to_string(),
            PLACE_COORDS,
        )])))
    }

    fn offer(user_id: &str, lat: f64, lon: f64, carpooling: bool) -> RideOffer {
        RideOffer {
            user_id: user_id.to_string(),
            pickup_lat: lat,
            pickup_long: lon,
            dropoff_lat: 28.70,
            dropoff_long: 77.10,
            request_time: "2024-05-03 09:15:00".to_string(),
            available_seats: 2,
            ride_status: RideStatus::Ongoing,
            carpooling_preference: carpooling,
        }
    }

    #[test]
    fn matches_nearby_opted_in_offers_in_dataset_order() {
        let dataset = RideDataset::from_offers(vec![
            offer("near-yes", 28.6310, 77.2180, true),
            offer("near-no", 28.6300, 77.2170, false),
            offer("far-yes", 28.7041, 77.1025, true),
            offer("near-yes-2", 28.6295, 77.2185, true),
        ]);
        let service = RideMatchService::new(geocoder());
        let matches = service
            .find_matches(&MatchQuery::new(PLACE), &dataset)
            .unwrap();
        let ids: Vec<&str> = matches.iter().map(|o| o.user_id.as_str()).collect();
        assert_eq!(ids, ["near-yes", "near-yes-2"]);
    }

    #[test]
    fn opted_out_offer_at_the_origin_is_excluded() {
        let dataset = RideDataset::from_offers(vec![offer(
            "opted-out",
            PLACE_COORDS.lat,
            PLACE_COORDS.lon,
            false,
        )]);
        let service = RideMatchService::new(geocoder());
        let matches = service
            .find_matches(&MatchQuery::new(PLACE), &dataset)
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn unknown_place_is_a_geocode_error() {
        let service = RideMatchService::new(geocoder());
        let err = service
            .find_matches(&MatchQuery::new("Atlantis"), &RideDataset::default())
            .unwrap_err();
        assert_eq!(err.kind(), "geocode");
        assert!(matches!(
            err,
            RideMatchError::Geocode(GeocodeError::NotFound(place)) if place == "Atlantis"
        ));
    }

    #[test]
    fn negative_radius_is_a_match_error() {
        let service = RideMatchService::new(geocoder());
        let query = MatchQuery::new(PLACE).with_max_distance_km(-2.0);
        let err = service
            .find_matches(&query, &RideDataset::default())
            .unwrap_err();
        assert_eq!(err.kind(), "match");
    }

    #[test]
    fn default_radius_is_two_kilometres() {
        assert_eq!(MatchQuery::new(PLACE).max_distance_km, 2.0);
    }

    #[test]
    fn wider_radius_reaches_farther_offers() {
        let dataset = RideDataset::from_offers(vec![offer("far-yes", 28.7041, 77.1025, true)]);
        let service = RideMatchService::new(geocoder());
        let near = service
            .find_matches(&MatchQuery::new(PLACE), &dataset)
            .unwrap();
        assert!(near.is_empty());
        let wide = service
            .find_matches(
                &MatchQuery::new(PLACE).with_max_distance_km(20.0),
                &dataset,
            )
            .unwrap();
        assert_eq!(wide.len(), 1);
    }
}
