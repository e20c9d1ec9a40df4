//! Checkout error types.

use common::{OrderId, UserId};
use inventory::InventoryError;
use thiserror::Error;

/// Errors that can occur during checkout operations.
///
/// The saga converts most of these into a failed [`crate::CheckoutOutcome`]
/// after compensation; only faults before anything was mutated propagate to
/// the caller.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No cart exists for the user.
    #[error("Cart not found for user {0}")]
    CartNotFound(UserId),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Inventory ledger error.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Cart store error.
    #[error("Cart service error: {0}")]
    Cart(String),

    /// Order store error.
    #[error("Order service error: {0}")]
    Order(String),

    /// Notification sender error.
    #[error("Notification error: {0}")]
    Notification(String),
}

/// Result type for checkout operations.
pub type Result<T> = std::result::Result<T, CheckoutError>;
