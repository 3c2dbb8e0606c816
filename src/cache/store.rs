//! Time-bounded key/value store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::cache::events::{CacheEvent, CacheEventListener, CacheEventLogger};
use crate::observability::metrics;

/// Errors a cache backend may report.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Cache port used by the pipeline.
#[async_trait]
pub trait ResultCache<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Value stored under `key`, unless absent or expired.
    async fn get(&self, key: &K) -> Option<V>;

    /// Store `value` under `key` for `ttl`, replacing any previous value.
    async fn put(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError>;

    /// Remove one key. Returns whether an entry was present.
    async fn invalidate(&self, key: &K) -> bool;

    /// Remove every entry.
    async fn clear(&self);

    /// Entries currently held, expired ones included until swept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// In-memory `ResultCache` with per-entry TTL and an entry-count bound.
///
/// When full, inserting a new key evicts the oldest entry.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: DashMap<K, Entry<V>>,
    max_entries: usize,
    listener: Arc<dyn CacheEventListener<K>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache that logs its events.
    pub fn new(name: &'static str, max_entries: usize) -> Self {
        Self::with_listener(name, max_entries, Arc::new(CacheEventLogger))
    }

    pub fn with_listener(
        name: &'static str,
        max_entries: usize,
        listener: Arc<dyn CacheEventListener<K>>,
    ) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
            listener,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            if entry.is_expired(now) {
                self.listener.on_event(self.name, CacheEvent::Expired, Some(key));
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            metrics::record_cache_size(self.name, self.entries.len());
        }
        removed
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            if self.entries.remove(&key).is_some() {
                self.listener.on_event(self.name, CacheEvent::Evicted, Some(&key));
            }
        }
    }
}

#[async_trait]
impl<K, V> ResultCache<K, V> for TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                metrics::record_cache_event(self.name, "hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.entries.remove_if(key, |_, e| e.is_expired(now)).is_some() {
            self.listener.on_event(self.name, CacheEvent::Expired, Some(key));
        }
        metrics::record_cache_event(self.name, "miss");
        None
    }

    async fn put(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError> {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        let entry = Entry {
            value,
            created_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key.clone(), entry);
        self.listener.on_event(self.name, CacheEvent::Created, Some(&key));
        metrics::record_cache_size(self.name, self.entries.len());
        Ok(())
    }

    async fn invalidate(&self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.listener.on_event(self.name, CacheEvent::Removed, Some(key));
            metrics::record_cache_size(self.name, self.entries.len());
        }
        removed
    }

    async fn clear(&self) {
        self.entries.clear();
        self.listener.on_event(self.name, CacheEvent::Cleared, None);
        metrics::record_cache_size(self.name, 0);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(CacheEvent, Option<String>)>>,
    }

    impl CacheEventListener<String> for Recorder {
        fn on_event(&self, _cache: &'static str, event: CacheEvent, key: Option<&String>) {
            self.events.lock().push((event, key.cloned()));
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_put_then_get() {
        let cache: TtlCache<String, Vec<u32>> = TtlCache::new("test", 10);
        assert!(cache.get(&"A".to_string()).await.is_none());

        cache.put("A".into(), vec![1, 2], HOUR).await.unwrap();
        assert_eq!(cache.get(&"A".to_string()).await, Some(vec![1, 2]));
        assert_eq!(cache.get(&"a".to_string()).await, None, "keys are case-sensitive");
    }

    #[tokio::test]
    async fn test_expired_entries_are_absent() {
        let recorder = Arc::new(Recorder::default());
        let cache: TtlCache<String, u32> = TtlCache::with_listener("test", 10, recorder.clone());

        cache.put("A".into(), 1, Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get(&"A".to_string()).await, None);
        assert_eq!(cache.len(), 0);
        assert_eq!(
            recorder.events.lock().last().cloned(),
            Some((CacheEvent::Expired, Some("A".to_string())))
        );
    }

    #[tokio::test]
    async fn test_invalidate_only_touches_one_key() {
        let cache: TtlCache<String, u32> = TtlCache::new("test", 10);
        cache.put("A".into(), 1, HOUR).await.unwrap();
        cache.put("B".into(), 2, HOUR).await.unwrap();

        assert!(cache.invalidate(&"A".to_string()).await);
        assert!(!cache.invalidate(&"A".to_string()).await);
        assert_eq!(cache.get(&"B".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let recorder = Arc::new(Recorder::default());
        let cache: TtlCache<String, u32> = TtlCache::with_listener("test", 2, recorder.clone());

        cache.put("A".into(), 1, HOUR).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.put("B".into(), 2, HOUR).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.put("C".into(), 3, HOUR).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"A".to_string()).await, None);
        assert_eq!(cache.get(&"C".to_string()).await, Some(3));
        assert!(recorder
            .events
            .lock()
            .contains(&(CacheEvent::Evicted, Some("A".to_string()))));
    }

    #[tokio::test]
    async fn test_overwrite_does_not_evict() {
        let cache: TtlCache<String, u32> = TtlCache::new("test", 1);
        cache.put("A".into(), 1, HOUR).await.unwrap();
        cache.put("A".into(), 2, HOUR).await.unwrap();
        assert_eq!(cache.get(&"A".to_string()).await, Some(2));
    }

    #[tokio::test]
    async fn test_clear_and_purge() {
        let cache: TtlCache<String, u32> = TtlCache::new("test", 10);
        cache.put("A".into(), 1, Duration::from_millis(10)).await.unwrap();
        cache.put("B".into(), 2, HOUR).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);

        cache.clear().await;
        assert!(cache.is_empty());
    }
}
