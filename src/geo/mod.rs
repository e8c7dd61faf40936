//! Great-circle distance utility
//!
//! Used by the matcher for nearest-provider selection and by nearby-entity
//! queries. Distances use the haversine formula on a spherical-Earth
//! approximation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Create a new location
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Distance to another location in kilometers
    pub fn distance_to(&self, other: &Location) -> f64 {
        distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two coordinates in kilometers
///
/// Haversine formula on a sphere of radius 6371 km. Symmetric in its
/// arguments and returns 0 for identical points.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        assert_eq!(distance_km(40.7128, -74.006, 40.7128, -74.006), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let ab = distance_km(40.7128, -74.006, 34.0522, -118.2437);
        let ba = distance_km(34.0522, -118.2437, 40.7128, -74.006);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_meridian() {
        // One degree of arc on a 6371 km sphere is ~111.195 km
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.1949).abs() < 0.01);
    }

    #[test]
    fn test_antipodal_points() {
        // Half the circumference: pi * 6371
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * 6371.0).abs() < 0.1);
    }

    #[test]
    fn test_known_distance() {
        // New York to Los Angeles, roughly 3936 km
        let d = distance_km(40.7128, -74.006, 34.0522, -118.2437);
        assert!(d > 3900.0 && d < 3970.0, "unexpected distance: {}", d);
    }

    #[test]
    fn test_location_distance_to() {
        let a = Location::new(40.7128, -74.006);
        let b = Location::new(40.715, -74.008);

        let d = a.distance_to(&b);
        assert!(d > 0.0 && d < 1.0);
        assert!((d - b.distance_to(&a)).abs() < 1e-9);
    }
}
