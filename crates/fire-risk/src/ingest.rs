//! Hotspot ingestion: cache-first, one upstream attempt, stale fallback

use crate::cache::HotspotCache;
use crate::feed::HotspotSource;
use crate::hotspot::HotspotRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where an ingested hotspot set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestOrigin {
    /// Served from a valid snapshot, no network call
    Cached,
    /// Downloaded during this call
    Fresh,
    /// Upstream failed, last snapshot served past its validity
    Stale,
    /// Upstream failed and nothing was cached
    Empty,
}

#[derive(Debug, Clone)]
pub struct IngestResult {
    pub records: Arc<[HotspotRecord]>,
    pub origin: IngestOrigin,
}

pub struct HotspotIngestor {
    source: Arc<dyn HotspotSource>,
    cache: Arc<HotspotCache>,
}

impl HotspotIngestor {
    pub fn new(source: Arc<dyn HotspotSource>, cache: Arc<HotspotCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<HotspotCache> {
        &self.cache
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Current hotspot set for the configured region
    ///
    /// Never fails: upstream errors degrade to the last snapshot or to an
    /// empty set.
    pub async fn current(&self, now: DateTime<Utc>) -> IngestResult {
        if let Some(snapshot) = self.cache.fresh(now).await {
            debug!("Using cached hotspots ({} records)", snapshot.records.len());
            return IngestResult {
                records: snapshot.records.clone(),
                origin: IngestOrigin::Cached,
            };
        }

        let attempts_seen = self.cache.refresh_attempts();
        let _guard = self.cache.refresh_guard().await;

        // Another request may have refreshed while we waited
        if let Some(snapshot) = self.cache.fresh(now).await {
            return IngestResult {
                records: snapshot.records.clone(),
                origin: IngestOrigin::Cached,
            };
        }

        // ...or tried and failed; don't queue another upstream call behind it
        if self.cache.refresh_attempts() != attempts_seen {
            debug!("Refresh already attempted while waiting, skipping fetch");
            return self.fallback().await;
        }

        info!("Refreshing hotspots from {}", self.source.name());

        let fetched = self.source.fetch().await;
        let result = match fetched {
            Ok(records) => {
                let snapshot = self.cache.replace(records, now).await;
                info!("Cached {} hotspots", snapshot.records.len());
                IngestResult {
                    records: snapshot.records.clone(),
                    origin: IngestOrigin::Fresh,
                }
            }
            Err(e) => {
                warn!("Hotspot fetch from {} failed: {}", self.source.name(), e);
                self.fallback().await
            }
        };
        self.cache.record_refresh_attempt();
        result
    }

    /// Last snapshot regardless of age, else an empty set
    async fn fallback(&self) -> IngestResult {
        match self.cache.latest().await {
            Some(snapshot) => {
                warn!(
                    "Serving stale hotspots fetched at {}",
                    snapshot.fetched_at.to_rfc3339()
                );
                IngestResult {
                    records: snapshot.records.clone(),
                    origin: IngestOrigin::Stale,
                }
            }
            None => IngestResult {
                records: Arc::from(Vec::new()),
                origin: IngestOrigin::Empty,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::{FireRiskError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory source with scripted responses and a call counter
    pub struct FakeSource {
        pub calls: AtomicUsize,
        responses: Mutex<Vec<Result<Vec<HotspotRecord>>>>,
        fallback: Option<Vec<HotspotRecord>>,
        pub delay: Duration,
    }

    impl FakeSource {
        /// Always returns `records`
        pub fn returning(records: Vec<HotspotRecord>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(Vec::new()),
                fallback: Some(records),
                delay: Duration::ZERO,
            }
        }

        /// Always fails with a connection error
        pub fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(Vec::new()),
                fallback: None,
                delay: Duration::ZERO,
            }
        }

        /// Plays `responses` in order, then behaves like [`FakeSource::failing`]
        pub fn scripted(mut responses: Vec<Result<Vec<HotspotRecord>>>) -> Self {
            responses.reverse();
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses),
                fallback: None,
                delay: Duration::ZERO,
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HotspotSource for FakeSource {
        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch(&self) -> Result<Vec<HotspotRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let scripted = self.responses.lock().unwrap().pop();
            match scripted {
                Some(response) => response,
                None => match &self.fallback {
                    Some(records) => Ok(records.clone()),
                    None => Err(FireRiskError::RequestFailed("connection refused".into())),
                },
            }
        }
    }
}
