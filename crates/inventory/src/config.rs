//! Inventory engine configuration loaded from environment variables.

use std::time::Duration;

/// Tunables for the reservation engine, with sensible defaults.
///
/// Reads from environment variables:
/// - `INVENTORY_LOCK_TTL_SECS` — SKU lease TTL in seconds (default: `5`)
/// - `INVENTORY_CACHE_TTL_SECS` — snapshot cache TTL in seconds (default: `60`)
/// - `DATABASE_URL` — PostgreSQL connection string (optional; absent for
///   in-memory deployments)
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub lock_ttl: Duration,
    pub cache_ttl: Duration,
    pub database_url: Option<String>,
}

impl InventoryConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            lock_ttl: Duration::from_secs(
                std::env::var("INVENTORY_LOCK_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
            cache_ttl: Duration::from_secs(
                std::env::var("INVENTORY_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            ),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
            database_url: None,
        }
    }
}
