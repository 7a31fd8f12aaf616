//! Upstream hotspot feeds
//!
//! [`FirmsClient`] pulls the NASA FIRMS area CSV product. The MAP_KEY is
//! rate limited and private, so it is kept out of logs and errors.
//!
//! ```text
//! [BASE_URL]/api/area/csv/[MAP_KEY]/[SOURCE]/[AREA]/[DAY_RANGE]
//!   e.g. /api/area/csv/<key>/VIIRS_NOAA20_NRT/105,-45,155,-10/7
//! ```

use crate::geo::BoundingBox;
use crate::hotspot::{parse_firms_csv, HotspotRecord};
use crate::{FireRiskError, Result};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

pub const FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov";

/// Near-real-time VIIRS product from NOAA-20
pub const DEFAULT_SOURCE: &str = "VIIRS_NOAA20_NRT";

pub const USER_AGENT: &str = "PropGuard-AI/1.0";

/// Anything that can produce a full hotspot set for the configured region
#[async_trait]
pub trait HotspotSource: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Download and parse the complete hotspot set. Single attempt.
    async fn fetch(&self) -> Result<Vec<HotspotRecord>>;
}

/// FIRMS client configuration
#[derive(Clone)]
pub struct FirmsConfig {
    pub base_url: String,
    pub map_key: String,
    pub source: String,
    pub bounds: BoundingBox,
    /// Lookback window in days (FIRMS allows 1-10)
    pub day_range: u8,
    pub timeout_sec: u64,
}

impl FirmsConfig {
    pub fn new(map_key: impl Into<String>) -> Self {
        Self {
            base_url: FIRMS_BASE_URL.to_string(),
            map_key: map_key.into(),
            source: DEFAULT_SOURCE.to_string(),
            bounds: BoundingBox::AUSTRALIA,
            day_range: 7,
            timeout_sec: 30,
        }
    }

    fn area_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.source,
            self.bounds.to_area_string(),
            self.day_range
        )
    }

    pub fn url(&self) -> String {
        format!(
            "{}/api/area/csv/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.map_key,
            self.area_path()
        )
    }
}

// Manual impl keeps the map key out of debug output
impl fmt::Debug for FirmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirmsConfig")
            .field("base_url", &self.base_url)
            .field("map_key", &"<redacted>")
            .field("source", &self.source)
            .field("bounds", &self.bounds)
            .field("day_range", &self.day_range)
            .field("timeout_sec", &self.timeout_sec)
            .finish()
    }
}

/// NASA FIRMS area API client
pub struct FirmsClient {
    config: FirmsConfig,
    client: reqwest::Client,
}

impl FirmsClient {
    pub fn new(config: FirmsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FireRiskError::RequestFailed(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &FirmsConfig {
        &self.config
    }

    fn map_send_error(&self, e: reqwest::Error) -> FireRiskError {
        if e.is_timeout() {
            FireRiskError::Timeout(self.config.timeout_sec)
        } else {
            // without_url() strips the key-bearing URL from the message
            FireRiskError::RequestFailed(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl HotspotSource for FirmsClient {
    fn name(&self) -> &str {
        "nasa-firms"
    }

    async fn fetch(&self) -> Result<Vec<HotspotRecord>> {
        info!("Fetching FIRMS hotspots: {}", self.config.area_path());

        let response = self
            .client
            .get(self.config.url())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FireRiskError::UpstreamStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FireRiskError::Timeout(self.config.timeout_sec)
            } else {
                FireRiskError::Parse(e.without_url().to_string())
            }
        })?;
        debug!("FIRMS payload: {} bytes", body.len());

        let records = parse_firms_csv(&body);
        info!("Fetched {} hotspots from FIRMS", records.len());
        Ok(records)
    }
}
