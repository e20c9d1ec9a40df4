use chrono::{DateTime, Utc};
use common::{MerchantId, ProductId, SkuKey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative stock counters for one SKU.
///
/// `available_qty` and `reserved_qty` are structurally non-negative.
/// Reserve, confirm and release only redistribute quantity between the two
/// counters; the sum changes only through `create` and the admin `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Surrogate row identifier.
    pub inventory_id: Uuid,
    pub product_id: ProductId,
    pub merchant_id: MerchantId,
    /// Quantity open for new reservations.
    pub available_qty: u32,
    /// Quantity held by in-flight checkouts, not yet confirmed.
    pub reserved_qty: u32,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Creates a fresh record with no reservations.
    pub fn new(key: &SkuKey, available_qty: u32) -> Self {
        Self {
            inventory_id: Uuid::new_v4(),
            product_id: key.product_id.clone(),
            merchant_id: key.merchant_id,
            available_qty,
            reserved_qty: 0,
            updated_at: Utc::now(),
        }
    }

    /// Returns the SKU key this record belongs to.
    pub fn key(&self) -> SkuKey {
        SkuKey::new(self.product_id.clone(), self.merchant_id)
    }

    /// Total quantity across both counters.
    pub fn total_qty(&self) -> u32 {
        self.available_qty + self.reserved_qty
    }
}
