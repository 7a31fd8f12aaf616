//! Fire risk aggregation
//!
//! Reduces a hotspot set to a single assessment for one property. Every
//! edge case (no data, nothing in range) is an explicit branch, so the
//! computation itself cannot fail.

use crate::geo::GeoPoint;
use crate::hotspot::HotspotRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Detections at which the count factor saturates
pub const COUNT_SATURATION: f64 = 20.0;

/// Summed FRP (MW) at which the intensity factor saturates
pub const INTENSITY_SATURATION_MW: f64 = 1000.0;

pub const DISTANCE_WEIGHT: f64 = 0.5;
pub const COUNT_WEIGHT: f64 = 0.3;
pub const INTENSITY_WEIGHT: f64 = 0.2;

pub const HIGH_THRESHOLD: f64 = 0.7;
pub const MEDIUM_THRESHOLD: f64 = 0.4;

/// Score reported when no fire is in range
pub const BASELINE_SCORE: f64 = 0.1;

/// Score reported when live data could not be used at all
pub const PLACEHOLDER_SCORE: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    /// Scored from FIRMS detections in range
    Live,
    /// Hotspot set was empty
    NoData,
    /// Hotspots exist but none within the radius
    NoNearbyFires,
    /// FIRMS credential not configured
    Fallback,
    /// Request could not be processed
    ErrorFallback,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Live => "live",
            DataSource::NoData => "no-data",
            DataSource::NoNearbyFires => "no-nearby-fires",
            DataSource::Fallback => "fallback",
            DataSource::ErrorFallback => "error-fallback",
        }
    }

    /// Display label for dashboards
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live => "NASA FIRMS Real-time",
            DataSource::NoData => "NASA FIRMS (No Data)",
            DataSource::NoNearbyFires => "NASA FIRMS (No Nearby Fires)",
            DataSource::Fallback => "Fallback Data",
            DataSource::ErrorFallback => "Error Fallback",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Fire risk for one coordinate, as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// 0.00-1.00, two decimals
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub nearby_fires: usize,
    /// km to the closest detection in range, 0 if none
    pub closest_fire_distance: f64,
    /// Summed FRP (MW) of detections in range
    #[serde(rename = "totalFRP")]
    pub total_frp: f64,
    pub data_source: DataSource,
    #[serde(serialize_with = "serialize_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl RiskAssessment {
    fn quiet(data_source: DataSource, now: DateTime<Utc>) -> Self {
        Self {
            risk_score: BASELINE_SCORE,
            risk_level: RiskLevel::from_score(BASELINE_SCORE),
            nearby_fires: 0,
            closest_fire_distance: 0.0,
            total_frp: 0.0,
            data_source,
            last_updated: now,
        }
    }

    /// Medium-risk stand-in used when live scoring was not possible
    pub fn placeholder(data_source: DataSource, now: DateTime<Utc>) -> Self {
        Self {
            risk_score: PLACEHOLDER_SCORE,
            risk_level: RiskLevel::from_score(PLACEHOLDER_SCORE),
            nearby_fires: 0,
            closest_fire_distance: 0.0,
            total_frp: 0.0,
            data_source,
            last_updated: now,
        }
    }
}

/// Raw factor values before weighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskFactors {
    pub distance: f64,
    pub count: f64,
    pub intensity: f64,
}

impl RiskFactors {
    pub fn new(min_distance_km: f64, count: usize, total_frp: f64) -> Self {
        Self {
            distance: 1.0 / (min_distance_km + 1.0),
            count: (count as f64 / COUNT_SATURATION).min(1.0),
            intensity: (total_frp / INTENSITY_SATURATION_MW).min(1.0),
        }
    }

    pub fn score(&self) -> f64 {
        (DISTANCE_WEIGHT * self.distance
            + COUNT_WEIGHT * self.count
            + INTENSITY_WEIGHT * self.intensity)
            .min(1.0)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Score fire exposure of `target` against `hotspots` within `radius_km`
pub fn assess(
    target: GeoPoint,
    hotspots: &[HotspotRecord],
    radius_km: f64,
    now: DateTime<Utc>,
) -> RiskAssessment {
    if hotspots.is_empty() {
        return RiskAssessment::quiet(DataSource::NoData, now);
    }

    let mut count = 0usize;
    let mut min_distance = f64::INFINITY;
    let mut total_frp = 0.0;

    for hotspot in hotspots {
        let distance = target.distance_km(hotspot.latitude, hotspot.longitude);
        if distance <= radius_km {
            count += 1;
            min_distance = min_distance.min(distance);
            total_frp += hotspot.radiative_power_mw;
        }
    }

    if count == 0 {
        return RiskAssessment::quiet(DataSource::NoNearbyFires, now);
    }

    let score = RiskFactors::new(min_distance, count, total_frp).score();

    RiskAssessment {
        // Level uses the unrounded score; 0.695 is Medium even though it prints as 0.7
        risk_level: RiskLevel::from_score(score),
        risk_score: round_to(score, 2),
        nearby_fires: count,
        closest_fire_distance: round_to(min_distance, 1),
        total_frp: round_to(total_frp, 1),
        data_source: DataSource::Live,
        last_updated: now,
    }
}
