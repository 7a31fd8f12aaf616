//! Assessment orchestration
//!
//! Validated query → hotspot ingestion → scoring. Outcomes that cannot be
//! scored are returned as a [`FailureReason`] and mapped to a placeholder
//! assessment at the HTTP boundary.

use crate::cache::HotspotCache;
use crate::feed::HotspotSource;
use crate::geo::GeoPoint;
use crate::ingest::{HotspotIngestor, IngestOrigin};
use crate::risk::{self, DataSource, RiskAssessment};
use crate::{FireRiskError, Result, DEFAULT_RADIUS_KM};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Validated assessment request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskQuery {
    pub target: GeoPoint,
    pub radius_km: f64,
}

impl RiskQuery {
    /// Radius defaults to [`DEFAULT_RADIUS_KM`]. Rejects non-finite or
    /// out-of-range coordinates and negative radii.
    pub fn new(latitude: f64, longitude: f64, radius_km: Option<f64>) -> Result<Self> {
        let target = GeoPoint::new(latitude, longitude)?;
        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(FireRiskError::InvalidRadius(radius_km));
        }
        Ok(Self { target, radius_km })
    }
}

/// Why a live assessment was not produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No FIRMS map key configured; the network is never touched
    MissingCredential,
    /// Request body could not be decoded
    MalformedRequest(String),
}

impl FailureReason {
    pub fn data_source(&self) -> DataSource {
        match self {
            FailureReason::MissingCredential => DataSource::Fallback,
            FailureReason::MalformedRequest(_) => DataSource::ErrorFallback,
        }
    }

    /// Medium-risk stand-in tagged with the matching provenance
    pub fn fallback_assessment(&self, now: DateTime<Utc>) -> RiskAssessment {
        RiskAssessment::placeholder(self.data_source(), now)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingCredential => write!(f, "FIRMS map key not configured"),
            FailureReason::MalformedRequest(e) => write!(f, "Malformed request: {}", e),
        }
    }
}

pub struct FireRiskService {
    ingestor: Option<HotspotIngestor>,
    cache: Arc<HotspotCache>,
}

impl FireRiskService {
    /// Live service backed by `source`
    pub fn new(source: Arc<dyn HotspotSource>, cache: Arc<HotspotCache>) -> Self {
        Self {
            ingestor: Some(HotspotIngestor::new(source, cache.clone())),
            cache,
        }
    }

    /// Service with no upstream credential; every query degrades to the
    /// configuration fallback
    pub fn unconfigured(cache: Arc<HotspotCache>) -> Self {
        Self {
            ingestor: None,
            cache,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.ingestor.is_some()
    }

    pub fn cache(&self) -> &Arc<HotspotCache> {
        &self.cache
    }

    pub async fn assess(
        &self,
        query: RiskQuery,
        now: DateTime<Utc>,
    ) -> std::result::Result<RiskAssessment, FailureReason> {
        let ingestor = self
            .ingestor
            .as_ref()
            .ok_or(FailureReason::MissingCredential)?;

        info!(
            "Analyzing fire risk for {} within {} km",
            query.target, query.radius_km
        );

        let ingested = ingestor.current(now).await;
        if ingested.origin == IngestOrigin::Stale {
            debug!("Scoring against stale hotspot snapshot");
        }

        let assessment = risk::assess(query.target, &ingested.records, query.radius_km, now);
        debug!(
            "Assessment for {}: {} ({:.2}, {} fires, source {})",
            query.target,
            assessment.risk_level,
            assessment.risk_score,
            assessment.nearby_fires,
            assessment.data_source
        );

        Ok(assessment)
    }
}
