//! Cart service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{MerchantId, Money, ProductId, SkuKey, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// One line of a cart: a SKU, a quantity and the unit price captured when
/// the item was added. Orders copy the price snapshot verbatim; items are
/// never re-priced at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub merchant_id: MerchantId,
    pub quantity: u32,
    pub price_snapshot: Money,
}

impl CartItem {
    /// Creates a new cart item.
    pub fn new(
        product_id: impl Into<ProductId>,
        merchant_id: impl Into<MerchantId>,
        quantity: u32,
        price_snapshot: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            merchant_id: merchant_id.into(),
            quantity,
            price_snapshot,
        }
    }

    /// Returns the SKU key this line refers to.
    pub fn sku(&self) -> SkuKey {
        SkuKey::new(self.product_id.clone(), self.merchant_id)
    }

    /// Returns price × quantity for this line.
    pub fn line_total(&self) -> Money {
        self.price_snapshot.multiply(self.quantity)
    }
}

/// A user's active cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Returns true if the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line totals.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

/// Trait for cart storage as consumed by the checkout saga.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Loads the active cart for a user.
    async fn get_cart(&self, user_id: UserId) -> Result<Cart>;

    /// Empties the user's cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    carts: HashMap<UserId, Vec<CartItem>>,
    fail_on_clear: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user's cart with the given items.
    pub fn set_cart(&self, user_id: UserId, items: Vec<CartItem>) {
        self.state.write().unwrap().carts.insert(user_id, items);
    }

    /// Configures the service to fail on clear calls.
    pub fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().unwrap().fail_on_clear = fail;
    }

    /// Returns true if a cart exists for the user.
    pub fn has_cart(&self, user_id: UserId) -> bool {
        self.state.read().unwrap().carts.contains_key(&user_id)
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn get_cart(&self, user_id: UserId) -> Result<Cart> {
        let state = self.state.read().unwrap();
        let items = state
            .carts
            .get(&user_id)
            .cloned()
            .ok_or(CheckoutError::CartNotFound(user_id))?;
        Ok(Cart { user_id, items })
    }

    async fn clear_cart(&self, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_clear {
            return Err(CheckoutError::Cart("Cart store unavailable".to_string()));
        }
        state.carts.remove(&user_id);
        Ok(())
    }
}
