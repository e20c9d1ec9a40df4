//! Inventory ledger boundary as consumed by the checkout saga.

use async_trait::async_trait;
use common::SkuKey;
use inventory::{
    InventoryCache, InventoryError, InventoryLedger, InventoryStore, ReserveOutcome, SkuMutex,
};

/// The slice of the inventory ledger the saga needs: reserve stock up
/// front, confirm it after payment, release it on compensation.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Moves quantity from available to reserved; insufficient stock is a
    /// soft [`ReserveOutcome::Insufficient`], not an error.
    async fn reserve(
        &self,
        key: &SkuKey,
        quantity: u32,
    ) -> Result<ReserveOutcome, InventoryError>;

    /// Permanently deducts a prior reservation.
    async fn confirm(&self, key: &SkuKey, quantity: u32) -> Result<(), InventoryError>;

    /// Returns a prior reservation to available stock, clamping as needed.
    async fn release(&self, key: &SkuKey, quantity: u32) -> Result<(), InventoryError>;
}

#[async_trait]
impl<S, M, C> StockLedger for InventoryLedger<S, M, C>
where
    S: InventoryStore,
    M: SkuMutex,
    C: InventoryCache,
{
    async fn reserve(
        &self,
        key: &SkuKey,
        quantity: u32,
    ) -> Result<ReserveOutcome, InventoryError> {
        InventoryLedger::reserve(self, key, quantity).await
    }

    async fn confirm(&self, key: &SkuKey, quantity: u32) -> Result<(), InventoryError> {
        InventoryLedger::confirm(self, key, quantity).await
    }

    async fn release(&self, key: &SkuKey, quantity: u32) -> Result<(), InventoryError> {
        InventoryLedger::release(self, key, quantity).await
    }
}
