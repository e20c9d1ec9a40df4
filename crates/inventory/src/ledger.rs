//! The inventory ledger: authoritative available/reserved counters.
//!
//! Every mutating operation follows the same shape: acquire the SKU lease,
//! load the row, validate, mutate, persist, evict the cached snapshot,
//! release the lease. The lease is always released, on success and on
//! failure alike; a failed release is logged and never propagated.
//!
//! Locks for different SKUs are never held simultaneously by one caller:
//! each operation runs acquire → mutate → release to completion before the
//! caller moves to the next SKU, which structurally rules out lock-ordering
//! deadlocks across keys.

use chrono::Utc;
use common::{MerchantId, SkuKey};

use crate::cache::{InMemoryInventoryCache, InventoryCache};
use crate::config::InventoryConfig;
use crate::error::{InventoryError, Result};
use crate::lock::{InMemorySkuMutex, LockToken, SkuMutex};
use crate::memory::InMemoryInventoryStore;
use crate::record::InventoryRecord;
use crate::store::InventoryStore;

/// Outcome of a reserve attempt.
///
/// Running out of stock is an expected business outcome, carried as data so
/// callers can distinguish it from infrastructure faults on the error
/// channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The quantity was moved from available to reserved.
    Reserved,
    /// Not enough available stock; state left unchanged.
    Insufficient { available: u32, requested: u32 },
}

impl ReserveOutcome {
    /// Returns true if the reservation succeeded.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReserveOutcome::Reserved)
    }

    /// Returns the rejection message for the insufficient case.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            ReserveOutcome::Reserved => None,
            ReserveOutcome::Insufficient {
                available,
                requested,
            } => Some(format!(
                "Insufficient inventory: available={available}, requested={requested}"
            )),
        }
    }
}

/// Composes the durable store, the per-SKU mutex and the snapshot cache
/// into the authoritative stock API.
///
/// Inventory rows are mutated only through this type; no other component
/// holds a writable path to the counters.
#[derive(Clone)]
pub struct InventoryLedger<S, M, C>
where
    S: InventoryStore,
    M: SkuMutex,
    C: InventoryCache,
{
    store: S,
    mutex: M,
    cache: C,
}

impl<S, M, C> InventoryLedger<S, M, C>
where
    S: InventoryStore,
    M: SkuMutex,
    C: InventoryCache,
{
    /// Creates a ledger over the given store, mutex and cache.
    pub fn new(store: S, mutex: M, cache: C) -> Self {
        Self {
            store,
            mutex,
            cache,
        }
    }

    /// Returns the mutex this ledger serializes writes through.
    pub fn mutex(&self) -> &M {
        &self.mutex
    }

    /// Fetches the current snapshot for a SKU, preferring the cache.
    ///
    /// A miss loads from the store and populates the cache.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, key: &SkuKey) -> Result<InventoryRecord> {
        if let Some(record) = self.cache.get(key).await {
            return Ok(record);
        }

        let record = self.load_required(key).await?;
        self.cache.put(record.clone()).await;
        Ok(record)
    }

    /// Moves `quantity` from available to reserved for a checkout.
    ///
    /// Not enough stock is a soft failure ([`ReserveOutcome::Insufficient`]),
    /// leaving the counters untouched.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, key: &SkuKey, quantity: u32) -> Result<ReserveOutcome> {
        let token = self.mutex.acquire(key).await?;
        let result = self.do_reserve(key, quantity).await;
        self.release_lease(key, token).await;
        result
    }

    /// Permanently deducts `quantity` from reserved after payment success.
    ///
    /// Confirming more than is reserved is an orchestration violation and
    /// fails hard with [`InventoryError::InsufficientReservation`].
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, key: &SkuKey, quantity: u32) -> Result<()> {
        let token = self.mutex.acquire(key).await?;
        let result = self.do_confirm(key, quantity).await;
        self.release_lease(key, token).await;
        result
    }

    /// Returns reserved quantity to available after a failed checkout.
    ///
    /// Clamps to whatever is still reserved, so compensation can never drive
    /// the counter negative.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, key: &SkuKey, quantity: u32) -> Result<()> {
        let token = self.mutex.acquire(key).await?;
        let result = self.do_release(key, quantity).await;
        self.release_lease(key, token).await;
        result
    }

    /// Registers stock for a new SKU with zero reservations.
    ///
    /// Does not populate the cache.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, key: &SkuKey, available_qty: u32) -> Result<InventoryRecord> {
        let record = InventoryRecord::new(key, available_qty);
        self.store.insert(&record).await?;
        tracing::info!(%key, available_qty, "created inventory");
        Ok(record)
    }

    /// Admin override of the available quantity.
    ///
    /// Overwrites `available_qty` without adjusting `reserved_qty`; callers
    /// own the consistency of what was implicitly promised.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, key: &SkuKey, available_qty: u32) -> Result<InventoryRecord> {
        let token = self.mutex.acquire(key).await?;
        let result = self.do_update(key, available_qty).await;
        self.release_lease(key, token).await;
        result
    }

    /// Lists all stock rows for one merchant.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<InventoryRecord>> {
        self.store.list_by_merchant(merchant_id).await
    }

    async fn do_reserve(&self, key: &SkuKey, quantity: u32) -> Result<ReserveOutcome> {
        let mut record = self.load_required(key).await?;

        if record.available_qty < quantity {
            metrics::counter!("inventory_reserve_rejected_total").increment(1);
            return Ok(ReserveOutcome::Insufficient {
                available: record.available_qty,
                requested: quantity,
            });
        }

        record.available_qty -= quantity;
        record.reserved_qty += quantity;
        record.updated_at = Utc::now();
        self.store.save(&record).await?;
        self.cache.evict(key).await;

        metrics::counter!("inventory_reserved_total").increment(1);
        tracing::info!(%key, quantity, "reserved stock");
        Ok(ReserveOutcome::Reserved)
    }

    async fn do_confirm(&self, key: &SkuKey, quantity: u32) -> Result<()> {
        let mut record = self.load_required(key).await?;

        if record.reserved_qty < quantity {
            return Err(InventoryError::InsufficientReservation {
                key: key.clone(),
                reserved: record.reserved_qty,
                requested: quantity,
            });
        }

        record.reserved_qty -= quantity;
        record.updated_at = Utc::now();
        self.store.save(&record).await?;
        self.cache.evict(key).await;

        tracing::info!(%key, quantity, "confirmed stock");
        Ok(())
    }

    async fn do_release(&self, key: &SkuKey, quantity: u32) -> Result<()> {
        let mut record = self.load_required(key).await?;

        let mut quantity = quantity;
        if record.reserved_qty < quantity {
            tracing::warn!(
                %key,
                requested = quantity,
                reserved = record.reserved_qty,
                "release exceeds reservation, clamping"
            );
            quantity = record.reserved_qty;
        }

        record.reserved_qty -= quantity;
        record.available_qty += quantity;
        record.updated_at = Utc::now();
        self.store.save(&record).await?;
        self.cache.evict(key).await;

        tracing::info!(%key, quantity, "released stock");
        Ok(())
    }

    async fn do_update(&self, key: &SkuKey, available_qty: u32) -> Result<InventoryRecord> {
        let mut record = self.load_required(key).await?;

        record.available_qty = available_qty;
        record.updated_at = Utc::now();
        self.store.save(&record).await?;
        self.cache.evict(key).await;

        tracing::info!(%key, available_qty, "updated inventory");
        Ok(record)
    }

    async fn load_required(&self, key: &SkuKey) -> Result<InventoryRecord> {
        self.store
            .load(key)
            .await?
            .ok_or_else(|| InventoryError::NotFound(key.clone()))
    }

    async fn release_lease(&self, key: &SkuKey, token: LockToken) {
        if let Err(e) = self.mutex.release(key, token).await {
            tracing::warn!(%key, error = %e, "failed to release sku lease");
        }
    }
}

impl InventoryLedger<InMemoryInventoryStore, InMemorySkuMutex, InMemoryInventoryCache> {
    /// Builds a fully in-process ledger from configuration, wiring the
    /// lease TTL and cache TTL through to the mutex and cache.
    pub fn in_memory(config: &InventoryConfig) -> Self {
        Self::new(
            InMemoryInventoryStore::new(),
            InMemorySkuMutex::with_ttl(config.lock_ttl),
            InMemoryInventoryCache::with_ttl(config.cache_ttl),
        )
    }
}
