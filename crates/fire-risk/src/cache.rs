//! Daily hotspot snapshot cache
//!
//! Holds the last successful FIRMS download. A snapshot is served as-is
//! while it is younger than 24h and was taken on the current UTC day;
//! otherwise it is only used as a stale fallback when a refresh fails.
//! Snapshots are replaced wholesale, never patched.

use crate::hotspot::HotspotRecord;
use crate::CACHE_TTL_HOURS;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

/// One complete download of the hotspot feed
#[derive(Debug, Clone)]
pub struct HotspotSnapshot {
    pub records: Arc<[HotspotRecord]>,
    pub fetched_at: DateTime<Utc>,
    pub calendar_date: NaiveDate,
}

impl HotspotSnapshot {
    pub fn new(records: Vec<HotspotRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records: records.into(),
            fetched_at,
            calendar_date: fetched_at.date_naive(),
        }
    }

    /// Same UTC day and younger than the TTL
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.calendar_date == now.date_naive()
            && now - self.fetched_at < Duration::hours(CACHE_TTL_HOURS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub populated: bool,
    pub fresh: bool,
    pub record_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub calendar_date: Option<NaiveDate>,
}

/// Shared hotspot cache, one per service instance
#[derive(Debug, Default)]
pub struct HotspotCache {
    snapshot: RwLock<Option<Arc<HotspotSnapshot>>>,
    refresh: Mutex<()>,
    /// Completed refresh attempts, successful or not
    attempts: AtomicU64,
}

impl HotspotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot if still valid at `now`
    pub async fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<HotspotSnapshot>> {
        let snapshot = self.snapshot.read().await;
        snapshot.as_ref().filter(|s| s.is_fresh(now)).cloned()
    }

    /// Last snapshot regardless of age
    pub async fn latest(&self) -> Option<Arc<HotspotSnapshot>> {
        self.snapshot.read().await.clone()
    }

    pub async fn replace(
        &self,
        records: Vec<HotspotRecord>,
        now: DateTime<Utc>,
    ) -> Arc<HotspotSnapshot> {
        let snapshot = Arc::new(HotspotSnapshot::new(records, now));
        *self.snapshot.write().await = Some(snapshot.clone());
        snapshot
    }

    pub async fn clear(&self) {
        *self.snapshot.write().await = None;
    }

    /// Serialises refreshes so concurrent misses trigger one upstream call.
    /// Holders must re-check [`HotspotCache::fresh`] and
    /// [`HotspotCache::refresh_attempts`] after acquiring.
    pub async fn refresh_guard(&self) -> MutexGuard<'_, ()> {
        self.refresh.lock().await
    }

    /// Number of finished refresh attempts. A change between reading this
    /// and acquiring the guard means another caller already tried upstream.
    pub fn refresh_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Call while holding the refresh guard, after the fetch resolves
    pub fn record_refresh_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::AcqRel);
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> CacheStats {
        let snapshot = self.snapshot.read().await;
        match snapshot.as_ref() {
            Some(s) => CacheStats {
                populated: true,
                fresh: s.is_fresh(now),
                record_count: s.records.len(),
                fetched_at: Some(s.fetched_at),
                calendar_date: Some(s.calendar_date),
            },
            None => CacheStats {
                populated: false,
                fresh: false,
                record_count: 0,
                fetched_at: None,
                calendar_date: None,
            },
        }
    }
}
