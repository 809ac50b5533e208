//! Bounded in-memory tier with per-entry time-to-live
//!
//! Entries are evicted least-recently-used first once capacity is reached and
//! are removed lazily when a lookup finds them expired. Expiry is measured on
//! `tokio::time::Instant` so tests can drive it with a paused clock.

use crate::errors::{CacheError, Result};
use crate::keys::CacheKey;
use crate::stats::CacheStats;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct MemoryEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Size-bounded LRU map whose entries expire after a TTL
pub struct InMemoryTTLCache<V> {
    entries: Mutex<LruCache<CacheKey, MemoryEntry<V>>>,
    default_ttl: Duration,
    stats: Arc<CacheStats>,
}

impl<V: Clone> InMemoryTTLCache<V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        Self::with_stats(capacity, default_ttl, Arc::new(CacheStats::default()))
    }

    /// Create a cache that reports into shared counters
    pub fn with_stats(
        capacity: usize,
        default_ttl: Duration,
        stats: Arc<CacheStats>,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| CacheError::configuration("memory capacity must be greater than zero"))?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
            stats,
        })
    }

    /// Look up a live entry and mark it most recently used.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            None => {
                self.stats.record_memory_miss();
                return None;
            }
            Some(entry) if now < entry.expires_at => {
                self.stats.record_memory_hit();
                return Some(entry.value.clone());
            }
            Some(_) => true,
        };

        if expired {
            entries.pop(key);
            self.stats.record_expiration();
            self.stats.record_memory_miss();
        }
        None
    }

    /// Store a value with the default TTL
    pub fn insert(&self, key: CacheKey, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Store a value, replacing any previous entry and evicting the least
    /// recently used one if the cache is full
    pub fn set(&self, key: CacheKey, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), MemoryEntry { value, expires_at }) {
            if evicted != key {
                tracing::trace!(key = %evicted, "evicted least recently used entry");
                self.stats.record_eviction();
            }
        }
    }

    /// Drop an entry; returns whether one was present
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
            self.stats.record_expiration();
        }
        expired.len()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
