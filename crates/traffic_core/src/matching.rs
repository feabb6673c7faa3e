//! Proximity matching: select ride offers whose pickup point lies within a
//! radius of an origin.

use crate::geo::{haversine_km, GeoPoint};
use crate::rides::RideOffer;

/// Trait for proximity matchers. Implementations must be `Send + Sync` so a
/// matcher can be shared behind a service used from several threads.
pub trait ProximityMatcher: Send + Sync {
    /// Return the offers within `max_distance_km` great-circle distance of
    /// `origin` that also satisfy `eligible`, preserving dataset order.
    ///
    /// The radius is inclusive: an offer exactly at `max_distance_km`
    /// matches. A negative (or NaN) radius is rejected.
    fn matches_within(
        &self,
        origin: GeoPoint,
        offers: &[RideOffer],
        max_distance_km: f64,
        eligible: &dyn Fn(&RideOffer) -> bool,
    ) -> Result<Vec<RideOffer>, MatchError>;
}

/// Linear-scan matcher: check every offer against the origin.
///
/// # Algorithm Behavior
///
/// 1. Iterates through `offers` in dataset order
/// 2. Keeps an offer when its pickup point is within `max_distance_km` of
///    `origin` and `eligible` returns true
/// 3. Returns kept offers in their input order (stable filter)
///
/// # Performance
///
/// Time complexity: O(n) where n is the number of offers, with no index to
/// build or maintain. An index-backed implementation can replace this
/// behind [`ProximityMatcher`] as long as it preserves dataset order.
#[derive(Debug, Default)]
pub struct LinearScanMatcher;

impl ProximityMatcher for LinearScanMatcher {
    fn matches_within(
        &self,
        origin: GeoPoint,
        offers: &[RideOffer],
        max_distance_km: f64,
        eligible: &dyn Fn(&RideOffer) -> bool,
    ) -> Result<Vec<RideOffer>, MatchError> {
        if max_distance_km < 0.0 || max_distance_km.is_nan() {
            return Err(MatchError::InvalidRadius(max_distance_km));
        }
        let matches = offers
            .iter()
            .filter(|offer| {
                haversine_km(origin, offer.pickup()) <= max_distance_km && eligible(offer)
            })
            .cloned()
            .collect();
        Ok(matches)
    }
}

#[derive(Debug)]
pub enum MatchError {
    /// The match radius must be a non-negative number of kilometres.
    InvalidRadius(f64),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::InvalidRadius(radius) => {
                write!(f, "match radius must be non-negative, got {radius}")
            }
        }
    }
}

impl std::error::Error for MatchError {}
