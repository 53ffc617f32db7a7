//! Time-bounded cache in front of an earthquake feed
//!
//! Results are keyed by `(days, min_magnitude)` and reused until they are
//! older than the TTL. The cache holds a fixed number of entries and evicts
//! the oldest one when full. Failed fetches are never cached.

use super::{EarthquakeFeed, FeedError, FeedQuery};
use crate::models::EarthquakeEvent;
use crate::observability::ServiceMetrics;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default lifetime of a cached result
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default number of distinct queries kept
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

type CacheKey = (u32, u64);

struct CacheEntry {
    fetched_at: Instant,
    events: Arc<Vec<EarthquakeEvent>>,
}

/// Caching wrapper around any [`EarthquakeFeed`]
pub struct CachedFeed<F> {
    inner: F,
    ttl: Duration,
    capacity: usize,
    entries: DashMap<CacheKey, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    metrics: Option<ServiceMetrics>,
}

impl<F: EarthquakeFeed> CachedFeed<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: F, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity: capacity.max(1),
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Count cache hits in the service metrics as they happen
    pub fn with_metrics(mut self, metrics: ServiceMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn stats(&self) -> FeedCacheStats {
        FeedCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn cached(&self, key: &CacheKey) -> Option<Arc<Vec<EarthquakeEvent>>> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(Arc::clone(&entry.events))
        } else {
            None
        }
    }

    fn store(&self, key: CacheKey, events: Arc<Vec<EarthquakeEvent>>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().fetched_at)
                .map(|entry| *entry.key());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                events,
            },
        );
    }
}

#[async_trait]
impl<F: EarthquakeFeed> EarthquakeFeed for CachedFeed<F> {
    async fn recent(&self, query: FeedQuery) -> Result<Vec<EarthquakeEvent>, FeedError> {
        let key = (query.days, query.min_magnitude.to_bits());

        if let Some(events) = self.cached(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            if let Some(metrics) = &self.metrics {
                metrics.inc_feed_cache_hits();
            }
            debug!(days = query.days, min_magnitude = query.min_magnitude, "Feed cache hit");
            return Ok(events.as_ref().clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let events = Arc::new(self.inner.recent(query).await?);
        self.store(key, Arc::clone(&events));
        Ok(events.as_ref().clone())
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}
