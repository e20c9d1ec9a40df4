use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{MerchantId, SkuKey};
use tokio::sync::RwLock;

use crate::error::{InventoryError, Result};
use crate::record::InventoryRecord;
use crate::store::InventoryStore;

/// In-memory inventory store for tests and single-process deployments.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    rows: Arc<RwLock<HashMap<SkuKey, InventoryRecord>>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows stored.
    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn load(&self, key: &SkuKey) -> Result<Option<InventoryRecord>> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn insert(&self, record: &InventoryRecord) -> Result<()> {
        let mut rows = self.rows.write().await;
        let key = record.key();
        if rows.contains_key(&key) {
            return Err(InventoryError::AlreadyExists(key));
        }
        rows.insert(key, record.clone());
        Ok(())
    }

    async fn save(&self, record: &InventoryRecord) -> Result<()> {
        let mut rows = self.rows.write().await;
        let key = record.key();
        if !rows.contains_key(&key) {
            return Err(InventoryError::NotFound(key));
        }
        rows.insert(key, record.clone());
        Ok(())
    }

    async fn list_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<InventoryRecord>> {
        let rows = self.rows.read().await;
        let mut records: Vec<_> = rows
            .values()
            .filter(|r| r.merchant_id == merchant_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.product_id.as_str().cmp(b.product_id.as_str()));
        Ok(records)
    }
}
