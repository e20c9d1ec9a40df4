//! Order service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{MerchantId, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};
use crate::services::cart::Cart;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

/// One immutable order line, captured from the cart at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub merchant_id: MerchantId,
    pub quantity: u32,
    pub price: Money,
}

/// An order as persisted by the order store.
///
/// Every saga path ends with the order in a terminal Paid/Paid or
/// Failed/Failed pair; an order is never left Created/Pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// Trait for order storage as consumed by the checkout saga.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Persists a new order in Created/Pending from the cart snapshot.
    ///
    /// The total is the sum of the cart's price snapshots × quantities;
    /// items are copied once and never re-priced.
    async fn create_order(
        &self,
        user_id: UserId,
        cart: &Cart,
        shipping_address: &str,
    ) -> Result<Order>;

    /// Updates an order to a new (order, payment) status pair.
    async fn update_status(
        &self,
        order_id: OrderId,
        order_status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<()>;

    /// Loads an order by ID.
    async fn get_order(&self, order_id: OrderId) -> Result<Order>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    orders: HashMap<OrderId, Order>,
    fail_on_update: bool,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on status updates.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.state.write().unwrap().fail_on_update = fail;
    }

    /// Returns the number of orders stored.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn create_order(
        &self,
        user_id: UserId,
        cart: &Cart,
        shipping_address: &str,
    ) -> Result<Order> {
        let order = Order {
            order_id: OrderId::new(),
            user_id,
            total_amount: cart.total(),
            order_status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            shipping_address: shipping_address.to_string(),
            items: cart
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    merchant_id: item.merchant_id,
                    quantity: item.quantity,
                    price: item.price_snapshot,
                })
                .collect(),
            created_at: Utc::now(),
        };

        let mut state = self.state.write().unwrap();
        state.orders.insert(order.order_id, order.clone());
        tracing::info!(order_id = %order.order_id, %user_id, "created order");
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        order_status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_update {
            return Err(CheckoutError::Order("Order store unavailable".to_string()));
        }
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(CheckoutError::OrderNotFound(order_id))?;
        order.order_status = order_status;
        order.payment_status = payment_status;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let state = self.state.read().unwrap();
        state
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(CheckoutError::OrderNotFound(order_id))
    }
}
