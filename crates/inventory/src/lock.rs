//! Per-SKU mutual exclusion with lease semantics.
//!
//! The mutex is the single serialization mechanism for inventory mutations.
//! A lease expires on its own if the holder never releases it, so a crashed
//! holder cannot wedge a SKU forever. The TTL must exceed the worst-case
//! duration of the critical section it guards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::SkuKey;
use uuid::Uuid;

use crate::error::{InventoryError, Result};

/// Default lease TTL.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(5);

/// Opaque proof of holding one lease.
///
/// Bound to a single (key, critical section) pair; it never outlives one
/// ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToken(Uuid);

impl LockToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Mutual exclusion per SKU key.
///
/// `acquire` is a single attempt: contention fails immediately with
/// [`InventoryError::LockAcquisitionFailed`], there is no retry or backoff.
/// Implementations for other deployment topologies (e.g. a distributed
/// lock) plug in behind this trait.
#[async_trait]
pub trait SkuMutex: Send + Sync {
    /// Acquires the lease for `key`, returning a token the holder must
    /// present on release.
    async fn acquire(&self, key: &SkuKey) -> Result<LockToken>;

    /// Releases the lease. Atomic compare-and-clear: a no-op if the stored
    /// token does not match or the lease already expired, so a lease claimed
    /// by a new holder is never clobbered.
    async fn release(&self, key: &SkuKey, token: LockToken) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct Lease {
    token: LockToken,
    expires_at: Instant,
}

/// In-process lease lock for single-instance deployments.
#[derive(Debug, Clone)]
pub struct InMemorySkuMutex {
    leases: Arc<Mutex<HashMap<SkuKey, Lease>>>,
    ttl: Duration,
}

impl InMemorySkuMutex {
    /// Creates a mutex with the default 5 second lease TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_LEASE_TTL)
    }

    /// Creates a mutex with a custom lease TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns true if a live lease exists for the key.
    pub fn is_locked(&self, key: &SkuKey) -> bool {
        let leases = self.leases.lock().unwrap();
        leases
            .get(key)
            .is_some_and(|lease| lease.expires_at > Instant::now())
    }
}

impl Default for InMemorySkuMutex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SkuMutex for InMemorySkuMutex {
    async fn acquire(&self, key: &SkuKey) -> Result<LockToken> {
        let mut leases = self.leases.lock().unwrap();
        let now = Instant::now();

        if let Some(lease) = leases.get(key)
            && lease.expires_at > now
        {
            return Err(InventoryError::LockAcquisitionFailed(key.clone()));
        }

        let token = LockToken::new();
        leases.insert(
            key.clone(),
            Lease {
                token,
                expires_at: now + self.ttl,
            },
        );
        Ok(token)
    }

    async fn release(&self, key: &SkuKey, token: LockToken) -> Result<()> {
        let mut leases = self.leases.lock().unwrap();

        if let Some(lease) = leases.get(key)
            && lease.token == token
            && lease.expires_at > Instant::now()
        {
            leases.remove(key);
            tracing::debug!(%key, "released sku lease");
        }
        Ok(())
    }
}
