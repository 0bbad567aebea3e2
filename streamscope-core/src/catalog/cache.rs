//! Time-bounded cache for upstream catalog responses
//!
//! Every entry carries its own TTL. Expired entries are invisible to `get`
//! but stay in storage until a purge removes them, so callers can still
//! reach them through `get_stale` when the upstream is down.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Stored value with its insertion time and lifetime.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// `None` when the TTL is too large to represent
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let inserted_at = Instant::now();
        Self {
            value,
            inserted_at,
            expires_at: inserted_at.checked_add(ttl),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }

    fn is_past_grace(&self, now: Instant, grace: Duration) -> bool {
        match self.expires_at.and_then(|expires_at| expires_at.checked_add(grace)) {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatistics {
    pub entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub expired_count: u64,
    pub purged_count: u64,
    pub hit_rate: f64,
}

impl CacheStatistics {
    /// Calculate hit rate as a fraction of all lookups
    pub fn calculate_hit_rate(hit_count: u64, miss_count: u64) -> f64 {
        if hit_count + miss_count == 0 {
            0.0
        } else {
            (hit_count as f64) / ((hit_count + miss_count) as f64)
        }
    }
}

/// Thread-safe key/value store with per-entry expiry.
///
/// No capacity bound; memory is reclaimed by `purge_expired` or the
/// background sweeper.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    expired_count: AtomicU64,
    purged_count: AtomicU64,
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            purged_count: AtomicU64::new(0),
        }
    }

    /// Returns the value if present and not yet expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let entries = self.entries.read();

        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                self.expired_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?key, "cache entry expired");
                None
            }
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?key, "cache miss");
                None
            }
        }
    }

    /// Returns the stored value even if it has expired.
    ///
    /// Used for degraded responses when a refetch fails. Does not count
    /// towards hit or miss statistics.
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).map(|entry| entry.value.clone())
    }

    /// Stores a value, replacing any existing entry for the key.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        tracing::debug!(?key, ?ttl, "caching value");
        self.entries.write().insert(key, CacheEntry::new(value, ttl));
    }

    /// Removes the entry for a key. Returns whether anything was removed.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Removes every entry whose key matches the predicate.
    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Drops every entry that expired more than `grace` ago.
    pub fn purge_expired(&self, grace: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_past_grace(now, grace));
        let removed = before - entries.len();

        if removed > 0 {
            self.purged_count
                .fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Age of the stored entry for a key, fresh or not.
    pub fn age(&self, key: &K) -> Option<Duration> {
        self.entries
            .read()
            .get(key)
            .map(|entry| entry.inserted_at.elapsed())
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        tracing::debug!("Cleared all cache entries");
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn statistics(&self) -> CacheStatistics {
        let hit_count = self.hit_count.load(Ordering::Relaxed);
        let miss_count = self.miss_count.load(Ordering::Relaxed);

        CacheStatistics {
            entries: self.len(),
            hit_count,
            miss_count,
            expired_count: self.expired_count.load(Ordering::Relaxed),
            purged_count: self.purged_count.load(Ordering::Relaxed),
            hit_rate: CacheStatistics::calculate_hit_rate(hit_count, miss_count),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Starts a background task purging expired entries every `interval`.
    ///
    /// The task only holds a weak reference and exits once the cache is
    /// dropped. Must be called from within a tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration, grace: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("Cache dropped, stopping sweeper");
                    break;
                };
                cache.purge_expired(grace);
            }
        })
    }
}
