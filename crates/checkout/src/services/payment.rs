//! Payment gateway boundary.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, OrderId};

/// Trait for the external payment gateway.
///
/// The gateway's internals are out of scope; the saga only cares whether a
/// charge went through. A `false` return triggers compensation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount for an order. Returns true on success.
    async fn process_payment(&self, order_id: OrderId, amount: Money) -> bool;
}

#[derive(Debug, Default)]
struct StubPaymentState {
    charges: Vec<(OrderId, Money)>,
    decline_all: bool,
}

/// Stub gateway that approves every charge unless told to decline.
#[derive(Debug, Clone, Default)]
pub struct StubPaymentGateway {
    state: Arc<RwLock<StubPaymentState>>,
}

impl StubPaymentGateway {
    /// Creates a new approving stub gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline all charges.
    pub fn set_decline_all(&self, decline: bool) {
        self.state.write().unwrap().decline_all = decline;
    }

    /// Returns the number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns the last successful charge, if any.
    pub fn last_charge(&self) -> Option<(OrderId, Money)> {
        self.state.read().unwrap().charges.last().copied()
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn process_payment(&self, order_id: OrderId, amount: Money) -> bool {
        let mut state = self.state.write().unwrap();
        if state.decline_all {
            tracing::info!(%order_id, %amount, "payment declined");
            return false;
        }
        state.charges.push((order_id, amount));
        tracing::info!(%order_id, %amount, "payment approved");
        true
    }
}
