//! Entitlement result cache
//!
//! Two independently bounded LRU partitions, one for positive ("allowed")
//! results and one for negative, each with its own TTL. Negative results
//! track roughly one block interval because a denial can flip as soon as
//! chain state changes; positive results live much longer. Entries that have
//! outlived their partition's TTL are evicted on read rather than served.

use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use hashlink::LruCache;
use tokio::sync::Mutex;

use crate::config::CacheConfig;

/// Values storable in the cache route themselves to a partition.
pub trait CacheResult {
    /// `true` sends the value to the positive partition, `false` to the
    /// negative one. For composite values this is "was the lookup itself
    /// successful", not "is the caller authorized".
    fn is_allowed(&self) -> bool;
}

impl CacheResult for bool {
    fn is_allowed(&self) -> bool {
        *self
    }
}

/// A cached value and the instant it was computed. Immutable once created.
#[derive(Debug, Clone)]
pub struct Timestamped<V> {
    value: V,
    cached_at: Instant,
}

impl<V> Timestamped<V> {
    fn new(value: V) -> Self {
        Self { value, cached_at: Instant::now() }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() < ttl
    }
}

/// Current entry counts, for tests and introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub positive_entries: usize,
    pub negative_entries: usize,
}

/// Dual-partition TTL cache keyed by normalized check arguments.
///
/// Keys must be pure values (`Hash + Eq + Clone`, no interior mutability) so
/// that equal check arguments always land on the same entry. Concurrent
/// misses for the same key are *not* deduplicated: both callers compute and
/// the last write wins. With second-scale negative TTLs this wastes at most a
/// duplicate RPC round, and it keeps the miss path lock-free.
pub struct EntitlementCache<K, V> {
    positive: Mutex<LruCache<K, Timestamped<V>>>,
    negative: Mutex<LruCache<K, Timestamped<V>>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl<K, V> EntitlementCache<K, V>
where
    K: Hash + Eq + Clone,
    V: CacheResult + Clone,
{
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            positive: Mutex::new(LruCache::new(config.positive_size)),
            negative: Mutex::new(LruCache::new(config.negative_size)),
            positive_ttl: config.positive_ttl,
            negative_ttl: config.negative_ttl,
        }
    }

    /// Fresh-entry lookup. A stale entry is removed from its partition and
    /// reported as a miss; it is never returned.
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let mut positive = self.positive.lock().await;
            if let Some(entry) = positive.get(key) {
                if entry.is_fresh(self.positive_ttl) {
                    return Some(entry.value.clone());
                }
                positive.remove(key);
            }
        }

        {
            let mut negative = self.negative.lock().await;
            if let Some(entry) = negative.get(key) {
                if entry.is_fresh(self.negative_ttl) {
                    return Some(entry.value.clone());
                }
                negative.remove(key);
            }
        }

        None
    }

    /// Store a value in the partition matching its polarity, stamped now.
    pub async fn put(&self, key: K, value: V) {
        let entry = Timestamped::new(value);
        if entry.value.is_allowed() {
            self.positive.lock().await.insert(key, entry);
        } else {
            self.negative.lock().await.insert(key, entry);
        }
    }

    /// Remove a key from whichever partition holds it.
    pub async fn invalidate(&self, key: &K) {
        self.positive.lock().await.remove(key);
        self.negative.lock().await.remove(key);
    }

    /// Cached execution: return a fresh entry if one exists, otherwise run
    /// `on_miss` and cache its result by polarity. Compute errors propagate
    /// and nothing is cached for them.
    ///
    /// Returns the value and whether it came from the cache.
    pub async fn execute_using_cache<F, Fut, E>(
        &self,
        key: &K,
        on_miss: F,
    ) -> Result<(V, bool), E>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok((value, true));
        }

        let value = on_miss(key.clone()).await?;
        self.put(key.clone(), value.clone()).await;
        Ok((value, false))
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            positive_entries: self.positive.lock().await.len(),
            negative_entries: self.negative.lock().await.len(),
        }
    }
}
