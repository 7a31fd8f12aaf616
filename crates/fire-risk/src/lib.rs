//! Bushfire Risk Scoring
//!
//! Pulls satellite thermal-anomaly hotspots from NASA FIRMS, keeps a daily
//! snapshot in memory, and scores how exposed a property location is to
//! active fires nearby.
//!
//! # Scoring Model (3-Factor)
//!
//! ```text
//! Risk = min(0.5·D + 0.3·C + 0.2·I, 1)
//! ```
//!
//! | Factor | Weight | Description |
//! |--------|--------|-------------|
//! | D      | 0.50   | Proximity: `1 / (closest_km + 1)` |
//! | C      | 0.30   | Count: nearby detections, saturates at 20 |
//! | I      | 0.20   | Intensity: summed FRP, saturates at 1000 MW |
//!
//! | Level  | Score |
//! |--------|-------|
//! | High   | ≥ 0.70 |
//! | Medium | ≥ 0.40 |
//! | Low    | < 0.40 |
//!
//! # Data Flow
//!
//! ```text
//! FirmsClient ──fetch──▶ HotspotIngestor ──▶ HotspotCache (24h, same UTC day)
//!                               │
//!                               ▼
//!   RiskQuery ──▶ FireRiskService ──▶ risk::assess ──▶ RiskAssessment
//! ```

use thiserror::Error;

pub mod cache;
pub mod feed;
pub mod geo;
pub mod hotspot;
pub mod ingest;
pub mod risk;
pub mod service;

pub use cache::{CacheStats, HotspotCache, HotspotSnapshot};
pub use feed::{FirmsClient, FirmsConfig, HotspotSource};
pub use geo::{haversine_km, BoundingBox, GeoPoint};
pub use hotspot::{parse_firms_csv, HotspotRecord};
pub use ingest::{HotspotIngestor, IngestOrigin, IngestResult};
pub use risk::{assess, DataSource, RiskAssessment, RiskLevel};
pub use service::{FailureReason, FireRiskService, RiskQuery};

/// Default search radius around a property in km
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Snapshot lifetime in hours
pub const CACHE_TTL_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum FireRiskError {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid search radius: {0}")]
    InvalidRadius(f64),
    #[error("Upstream request timed out after {0}s")]
    Timeout(u64),
    #[error("Upstream request failed: {0}")]
    RequestFailed(String),
    #[error("Upstream returned status {0}")]
    UpstreamStatus(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FireRiskError>;
