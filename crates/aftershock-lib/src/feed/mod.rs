//! Earthquake catalog feed
//!
//! The prediction path never touches this module. It backs the recent
//! earthquakes listing: a USGS client plus a time-bounded cache in front of it.

mod cache;
mod usgs;

pub use cache::{CachedFeed, FeedCacheStats, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use usgs::{UsgsFeed, DEFAULT_MAX_RESULTS, DEFAULT_USGS_URL};

use crate::models::EarthquakeEvent;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

/// Errors from the upstream catalog
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Recency window and magnitude floor for a catalog query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedQuery {
    pub days: u32,
    pub min_magnitude: f64,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            days: 7,
            min_magnitude: 4.0,
        }
    }
}

/// Source of recent earthquake events
#[async_trait]
pub trait EarthquakeFeed: Send + Sync {
    /// Events in the window, largest magnitude first
    async fn recent(&self, query: FeedQuery) -> Result<Vec<EarthquakeEvent>, FeedError>;
}

#[async_trait]
impl<T: EarthquakeFeed + ?Sized> EarthquakeFeed for Arc<T> {
    async fn recent(&self, query: FeedQuery) -> Result<Vec<EarthquakeEvent>, FeedError> {
        (**self).recent(query).await
    }
}

/// Sort by magnitude descending; events without a magnitude go last
pub fn sort_by_magnitude(events: &mut [EarthquakeEvent]) {
    events.sort_by(|a, b| match (a.magnitude, b.magnitude) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
pub(crate) fn test_event(id: &str, magnitude: Option<f64>) -> EarthquakeEvent {
    EarthquakeEvent {
        id: id.to_string(),
        magnitude,
        latitude: 0.0,
        longitude: 0.0,
        depth: 10.0,
        time: "2024-01-01T00:00:00+00:00".to_string(),
        place: "Somewhere".to_string(),
        updated: "2024-01-01T00:00:00+00:00".to_string(),
        url: String::new(),
        detail_url: String::new(),
    }
}
