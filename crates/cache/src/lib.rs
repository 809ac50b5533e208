//! Two-tier cache for upstream API responses
//!
//! - **`memory`**: a bounded LRU map with per-entry TTL for small structured payloads
//! - **`file`**: durable `<digest>.bin` files for large or binary payloads,
//!   written atomically and expired by modification time
//! - **`keys`**: deterministic request keys shared by both tiers
//! - **`stats`**: hit/miss/write counters

pub mod errors;
pub mod file;
pub mod keys;
pub mod memory;
pub mod stats;

pub use errors::{CacheError, RecoveryHint, Result};
pub use file::{BinaryFileCache, CachedFile, PurgeReport, SweeperHandle};
pub use keys::CacheKey;
pub use memory::InMemoryTTLCache;
pub use stats::{CacheStats, StatsSnapshot};
