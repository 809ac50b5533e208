//! Hit/miss/write counters shared by both tiers and the orchestrator

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters; one instance is shared by the memory tier, the file
/// tier and the orchestrator through an `Arc`
#[derive(Debug, Default)]
pub struct CacheStats {
    memory_hits: AtomicU64,
    memory_misses: AtomicU64,
    file_hits: AtomicU64,
    file_misses: AtomicU64,
    upstream_fetches: AtomicU64,
    writes: AtomicU64,
    bytes_written: AtomicU64,
    write_failures: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub file_hits: u64,
    pub file_misses: u64,
    pub upstream_fetches: u64,
    pub writes: u64,
    pub bytes_written: u64,
    pub write_failures: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_memory_miss(&self) {
        self.memory_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_hit(&self) {
        self.file_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_miss(&self) {
        self.file_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_fetch(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self, size: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            memory_misses: self.memory_misses.load(Ordering::Relaxed),
            file_hits: self.file_hits.load(Ordering::Relaxed),
            file_misses: self.file_misses.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Fraction of lookups served by either tier
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.file_hits;
        let total = hits + self.upstream_fetches;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
