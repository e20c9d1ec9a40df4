//! Read-through snapshot cache for inventory records.
//!
//! The cache sits outside the durability boundary: every mutating ledger
//! operation evicts after the durable write, and a crash between the two can
//! serve a snapshot that is stale for up to the TTL window. That staleness is
//! acceptable; the counters themselves stay authoritative in the store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::SkuKey;

use crate::record::InventoryRecord;

/// Default snapshot TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Snapshot cache keyed by SKU.
#[async_trait]
pub trait InventoryCache: Send + Sync {
    /// Returns the cached snapshot, or `None` on a miss or an expired entry.
    async fn get(&self, key: &SkuKey) -> Option<InventoryRecord>;

    /// Stores a full snapshot, resetting its TTL.
    async fn put(&self, record: InventoryRecord);

    /// Removes the key.
    async fn evict(&self, key: &SkuKey);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: InventoryRecord,
    expires_at: Instant,
}

/// In-process snapshot cache.
#[derive(Debug, Clone)]
pub struct InMemoryInventoryCache {
    entries: Arc<RwLock<HashMap<SkuKey, CacheEntry>>>,
    ttl: Duration,
}

impl InMemoryInventoryCache {
    /// Creates a cache with the default 60 second TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns true if a live entry exists for the key.
    pub fn contains(&self, key: &SkuKey) -> bool {
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }
}

impl Default for InMemoryInventoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryCache for InMemoryInventoryCache {
    async fn get(&self, key: &SkuKey) -> Option<InventoryRecord> {
        let entries = self.entries.read().unwrap();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.record.clone())
    }

    async fn put(&self, record: InventoryRecord) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            record.key(),
            CacheEntry {
                record,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    async fn evict(&self, key: &SkuKey) {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
    }
}
