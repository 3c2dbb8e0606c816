//! Cache event notifications.

use std::fmt::Display;

use crate::observability::metrics;

/// Lifecycle events of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Created,
    Expired,
    Removed,
    Evicted,
    Cleared,
}

impl CacheEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEvent::Created => "created",
            CacheEvent::Expired => "expired",
            CacheEvent::Removed => "removed",
            CacheEvent::Evicted => "evicted",
            CacheEvent::Cleared => "cleared",
        }
    }
}

/// Observer of cache events. Called synchronously; keep it cheap.
pub trait CacheEventListener<K>: Send + Sync {
    /// `key` is `None` for whole-cache events (`Cleared`).
    fn on_event(&self, cache: &'static str, event: CacheEvent, key: Option<&K>);
}

/// Logs every event and counts it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheEventLogger;

impl<K: Display> CacheEventListener<K> for CacheEventLogger {
    fn on_event(&self, cache: &'static str, event: CacheEvent, key: Option<&K>) {
        match key {
            Some(key) => tracing::info!(cache, event = event.as_str(), key = %key, "Cache event"),
            None => tracing::info!(cache, event = event.as_str(), "Cache event"),
        }
        metrics::record_cache_event(cache, event.as_str());
    }
}
