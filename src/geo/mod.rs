//! Geographic helpers
//!
//! Points and great-circle distance between them.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles
const EARTH_RADIUS_MILES: f64 = 3958.7613;

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.344;

/// A point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCode {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCode {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a store coordinate pair, which is ordered `[lng, lat]`
    pub fn from_lng_lat(coordinates: &[f64]) -> Option<Self> {
        match coordinates {
            [lng, lat, ..] if lat.is_finite() && lng.is_finite() => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    /// Coordinate pair in store order
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in miles, rounded to 2 decimal places.
///
/// Returns `None` when either point is missing.
pub fn distance_miles(a: Option<&GeoCode>, b: Option<&GeoCode>) -> Option<f64> {
    let (a, b) = (a?, b?);
    Some(round2(haversine_miles(a, b)))
}

/// Unrounded haversine distance in miles
pub fn haversine_miles(a: &GeoCode, b: &GeoCode) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    // Clamp guards against h drifting past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

/// Unrounded haversine distance in meters
pub fn haversine_meters(a: &GeoCode, b: &GeoCode) -> f64 {
    haversine_miles(a, b) * METERS_PER_MILE
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
