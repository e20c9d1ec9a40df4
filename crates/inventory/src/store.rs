//! Durable storage for inventory rows.

use async_trait::async_trait;
use common::{MerchantId, SkuKey};

use crate::error::Result;
use crate::record::InventoryRecord;

/// Row storage behind the ledger.
///
/// The store does not serialize writers; the ledger's [`crate::SkuMutex`]
/// does. Implementations only need the `(product_id, merchant_id)` unique
/// constraint for `insert`.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Loads the row for a SKU, if one exists.
    async fn load(&self, key: &SkuKey) -> Result<Option<InventoryRecord>>;

    /// Inserts a new row. Fails with
    /// [`crate::InventoryError::AlreadyExists`] on a duplicate key.
    async fn insert(&self, record: &InventoryRecord) -> Result<()>;

    /// Overwrites an existing row. Fails with
    /// [`crate::InventoryError::NotFound`] if the row is absent.
    async fn save(&self, record: &InventoryRecord) -> Result<()>;

    /// Lists all rows belonging to one merchant, ordered by product ID.
    async fn list_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<InventoryRecord>>;
}
