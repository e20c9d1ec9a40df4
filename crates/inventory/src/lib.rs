//! Inventory reservation engine for a multi-merchant marketplace.
//!
//! Stock for each SKU (a product sold by one merchant) lives in a pair of
//! counters, available and reserved. The [`InventoryLedger`] is the only
//! writer: it serializes mutations per SKU through a lease-based
//! [`SkuMutex`], persists rows through an [`InventoryStore`] (in-memory or
//! PostgreSQL), and keeps a read-through [`InventoryCache`] of snapshots
//! that is evicted after every write.
//!
//! Reservations follow a reserve → confirm/release protocol: checkout
//! reserves stock up front, confirms it permanently after payment, or
//! releases it back when anything downstream fails.

pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use cache::{DEFAULT_CACHE_TTL, InMemoryInventoryCache, InventoryCache};
pub use config::InventoryConfig;
pub use error::{InventoryError, Result};
pub use ledger::{InventoryLedger, ReserveOutcome};
pub use lock::{DEFAULT_LEASE_TTL, InMemorySkuMutex, LockToken, SkuMutex};
pub use memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use record::InventoryRecord;
pub use store::InventoryStore;
