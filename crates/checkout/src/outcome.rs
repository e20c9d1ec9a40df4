//! Terminal result of one checkout invocation.

use common::OrderId;

use crate::services::order::Order;

/// The outcome every saga path terminates in.
///
/// A failure before the order was created carries no order ID; every later
/// failure does, so callers can look the failed order up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Checkout completed; the order is Paid/Paid.
    Success { order_id: OrderId, order: Order },
    /// Checkout failed after compensation; the order, if any, is
    /// Failed/Failed.
    Failure {
        order_id: Option<OrderId>,
        reason: String,
    },
}

impl CheckoutOutcome {
    /// Creates a success outcome.
    pub fn success(order_id: OrderId, order: Order) -> Self {
        Self::Success { order_id, order }
    }

    /// Creates a failure outcome.
    pub fn failure(order_id: Option<OrderId>, reason: impl Into<String>) -> Self {
        Self::Failure {
            order_id,
            reason: reason.into(),
        }
    }

    /// Returns true for the success case.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the order ID, if one was created.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Success { order_id, .. } => Some(*order_id),
            Self::Failure { order_id, .. } => *order_id,
        }
    }

    /// Returns the failure reason, if this is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason),
        }
    }
}
