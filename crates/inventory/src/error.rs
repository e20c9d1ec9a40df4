use common::SkuKey;
use thiserror::Error;

/// Errors that can occur during inventory operations.
///
/// "Not enough stock" is deliberately absent: an insufficient reserve is an
/// expected business outcome and is carried as [`crate::ReserveOutcome`],
/// not as an error.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No inventory row exists for the SKU.
    #[error("Inventory not found for {0}")]
    NotFound(SkuKey),

    /// An inventory row already exists for the SKU.
    #[error("Inventory already exists for {0}")]
    AlreadyExists(SkuKey),

    /// The per-SKU lease lock is held by another caller. Single attempt,
    /// no retry.
    #[error("Could not acquire inventory lock for {0}")]
    LockAcquisitionFailed(SkuKey),

    /// A confirm asked for more than is reserved. This indicates an
    /// orchestration bug, not a business condition.
    #[error("Cannot confirm {key}: reserved={reserved}, requested={requested}")]
    InsufficientReservation {
        key: SkuKey,
        reserved: u32,
        requested: u32,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
