//! Background purge of expired cache entries.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::cache::store::TtlCache;

/// Purge expired entries every `interval` until shutdown is signalled.
pub async fn run_sweeper<K, V>(
    cache: Arc<TtlCache<K, V>>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) where
    K: Eq + Hash + Clone + std::fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tracing::info!(cache = cache.name(), interval_secs = interval.as_secs(), "Cache sweeper starting");

    let mut ticker = time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = cache.purge_expired();
                if removed > 0 {
                    tracing::debug!(cache = cache.name(), removed, "Swept expired cache entries");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!(cache = cache.name(), "Cache sweeper received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::ResultCache;

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let cache: Arc<TtlCache<String, u32>> = Arc::new(TtlCache::new("test", 10));
        cache.put("A".into(), 1, Duration::from_millis(5)).await.unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_sweeper(cache.clone(), Duration::from_millis(20), rx));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.len(), 0);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
