use async_trait::async_trait;
use common::{MerchantId, ProductId, SkuKey};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{InventoryError, Result};
use crate::record::InventoryRecord;
use crate::store::InventoryStore;

/// PostgreSQL-backed inventory store.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<InventoryRecord> {
        // Quantity columns carry CHECK (>= 0) constraints, so the widening
        // casts below cannot observe negative values.
        Ok(InventoryRecord {
            inventory_id: row.try_get::<Uuid, _>("inventory_id")?,
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            merchant_id: MerchantId::new(row.try_get::<i32, _>("merchant_id")?),
            available_qty: row.try_get::<i32, _>("available_qty")? as u32,
            reserved_qty: row.try_get::<i32, _>("reserved_qty")? as u32,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn load(&self, key: &SkuKey) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(
            r#"
            SELECT inventory_id, product_id, merchant_id, available_qty, reserved_qty, updated_at
            FROM inventory
            WHERE product_id = $1 AND merchant_id = $2
            "#,
        )
        .bind(key.product_id.as_str())
        .bind(key.merchant_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn insert(&self, record: &InventoryRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (inventory_id, product_id, merchant_id, available_qty, reserved_qty, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.inventory_id)
        .bind(record.product_id.as_str())
        .bind(record.merchant_id.as_i32())
        .bind(record.available_qty as i32)
        .bind(record.reserved_qty as i32)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_product_merchant")
            {
                return InventoryError::AlreadyExists(record.key());
            }
            InventoryError::Storage(e)
        })?;

        Ok(())
    }

    async fn save(&self, record: &InventoryRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET available_qty = $3, reserved_qty = $4, updated_at = $5
            WHERE product_id = $1 AND merchant_id = $2
            "#,
        )
        .bind(record.product_id.as_str())
        .bind(record.merchant_id.as_i32())
        .bind(record.available_qty as i32)
        .bind(record.reserved_qty as i32)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::NotFound(record.key()));
        }
        Ok(())
    }

    async fn list_by_merchant(&self, merchant_id: MerchantId) -> Result<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT inventory_id, product_id, merchant_id, available_qty, reserved_qty, updated_at
            FROM inventory
            WHERE merchant_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(merchant_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
