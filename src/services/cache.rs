//! Single-slot TTL cache in front of the heatmap fetch pipeline.
//!
//! The slot always reflects the latest fetch attempt: a failed refresh empties
//! the points and records the error instead of leaving old data in place, and
//! it still stamps `fetched_at` so a broken upstream is retried at most once
//! per TTL window.
//!
//! With a TTL, refreshes are single-flight. Callers that find the slot stale
//! queue on `refresh_lock`; whoever gets it first fetches, and the rest
//! re-check freshness before deciding to fetch themselves. Without a TTL
//! every call fetches on its own and only the slot update is serialized.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::services::points::Point;

pub trait PointSource: Send + Sync {
    fn fetch_points(&self) -> impl Future<Output = Result<Vec<Point>, FetchError>> + Send;
}

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    points: Arc<Vec<Point>>,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<FetchError>,
}

#[derive(Debug, Clone)]
pub struct CacheRead {
    pub points: Arc<Vec<Point>>,
    /// Set only when this call ran a fetch and it failed.
    pub error: Option<FetchError>,
}

#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub points: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<FetchError>,
}

pub struct HeatmapCache<S> {
    source: S,
    ttl: Option<ChronoDuration>,
    entry: RwLock<CacheEntry>,
    refresh_lock: Mutex<()>,
}

impl<S: PointSource> HeatmapCache<S> {
    /// `ttl_seconds <= 0` disables caching; every call fetches.
    pub fn new(source: S, ttl_seconds: i64) -> Self {
        let ttl = (ttl_seconds > 0)
            .then(|| ChronoDuration::seconds(ttl_seconds.min(i64::MAX / 1000)));
        Self {
            source,
            ttl,
            entry: RwLock::new(CacheEntry::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn get_or_fetch(&self, now: DateTime<Utc>) -> CacheRead {
        // Nothing to share without a TTL; concurrent callers fetch independently.
        if self.ttl.is_none() {
            return self.refresh(now).await;
        }

        if let Some(points) = self.fresh_points(now) {
            return CacheRead {
                points,
                error: None,
            };
        }

        let _refresh = self.refresh_lock.lock().await;
        if let Some(points) = self.fresh_points(now) {
            tracing::debug!("heatmap refreshed by a concurrent request");
            return CacheRead {
                points,
                error: None,
            };
        }

        self.refresh(now).await
    }

    async fn refresh(&self, now: DateTime<Utc>) -> CacheRead {
        match self.source.fetch_points().await {
            Ok(points) => {
                let points = Arc::new(points);
                tracing::debug!(points = points.len(), "heatmap cache refreshed");
                *self.write_entry() = CacheEntry {
                    points: points.clone(),
                    fetched_at: Some(now),
                    last_error: None,
                };
                CacheRead {
                    points,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "heatmap fetch failed");
                let points = Arc::new(Vec::new());
                *self.write_entry() = CacheEntry {
                    points: points.clone(),
                    fetched_at: Some(now),
                    last_error: Some(err.clone()),
                };
                CacheRead {
                    points,
                    error: Some(err),
                }
            }
        }
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.read_entry().last_error.clone()
    }

    pub fn status(&self) -> CacheStatus {
        let entry = self.read_entry();
        CacheStatus {
            points: entry.points.len(),
            fetched_at: entry.fetched_at,
            last_error: entry.last_error.clone(),
        }
    }

    fn fresh_points(&self, now: DateTime<Utc>) -> Option<Arc<Vec<Point>>> {
        let ttl = self.ttl?;
        let entry = self.read_entry();
        let fetched_at = entry.fetched_at?;
        (now - fetched_at < ttl).then(|| entry.points.clone())
    }

    fn read_entry(&self) -> RwLockReadGuard<'_, CacheEntry> {
        match self.entry.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Recovering heatmap cache from poisoned lock");
                poisoned.into_inner()
            }
        }
    }

    fn write_entry(&self) -> RwLockWriteGuard<'_, CacheEntry> {
        match self.entry.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Recovering heatmap cache from poisoned lock");
                poisoned.into_inner()
            }
        }
    }
}
