//! Shared identifier and value types used across the inventory and
//! checkout crates.

pub mod types;

pub use types::{MerchantId, Money, OrderId, ProductId, SkuKey, UserId};
