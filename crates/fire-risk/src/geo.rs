//! Geodesy primitives: great-circle distance and coordinate validation

use crate::{FireRiskError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Mean Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in km
///
/// Inputs are degrees. Non-finite inputs propagate as NaN; callers that
/// accept external coordinates go through [`GeoPoint::new`] first.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlon = (lon2 - lon1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (-180.0..=180.0).contains(&lon)
}

/// A validated WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !is_valid_latitude(latitude) {
            return Err(FireRiskError::InvalidCoordinates(format!(
                "latitude {} outside -90..=90",
                latitude
            )));
        }
        if !is_valid_longitude(longitude) {
            return Err(FireRiskError::InvalidCoordinates(format!(
                "longitude {} outside -180..=180",
                longitude
            )));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_km(self.latitude, self.longitude, latitude, longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Lon/lat rectangle used to scope FIRMS area queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Continental Australia plus Tasmania
    pub const AUSTRALIA: BoundingBox = BoundingBox {
        min_lon: 105.0,
        min_lat: -45.0,
        max_lon: 155.0,
        max_lat: -10.0,
    };

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }

    /// FIRMS area coordinates: `min_lon,min_lat,max_lon,max_lat`
    pub fn to_area_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::AUSTRALIA
    }
}
