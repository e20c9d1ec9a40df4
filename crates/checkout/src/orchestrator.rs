//! Checkout saga orchestrator.
//!
//! Drives cart → order → reserve → pay → confirm across service
//! boundaries, with compensation instead of a distributed transaction.
//! Every branch terminates in a [`CheckoutOutcome`]; the only fault allowed
//! to escape to the caller is one raised while creating the order, before
//! any stock was touched.

use std::time::Instant;

use common::{SkuKey, UserId};

use crate::error::Result;
use crate::outcome::CheckoutOutcome;
use crate::services::cart::CartService;
use crate::services::notification::NotificationSender;
use crate::services::order::{OrderService, OrderStatus, PaymentStatus};
use crate::services::payment::PaymentGateway;
use crate::services::stock::StockLedger;

/// One entry of the saga-local reservation intent: a reservation that
/// succeeded and must be released if a later step fails. Never persisted.
#[derive(Debug, Clone)]
struct ReservedItem {
    key: SkuKey,
    quantity: u32,
}

/// Orchestrates the checkout saga.
///
/// Reservations run strictly sequentially in cart order, one SKU lease at a
/// time; the saga never holds two leases at once, so there is no lock
/// ordering to get wrong.
pub struct CheckoutOrchestrator<Ca, Or, L, P, N>
where
    Ca: CartService,
    Or: OrderService,
    L: StockLedger,
    P: PaymentGateway,
    N: NotificationSender,
{
    carts: Ca,
    orders: Or,
    ledger: L,
    payment: P,
    notifier: N,
}

impl<Ca, Or, L, P, N> CheckoutOrchestrator<Ca, Or, L, P, N>
where
    Ca: CartService,
    Or: OrderService,
    L: StockLedger,
    P: PaymentGateway,
    N: NotificationSender,
{
    /// Creates a new orchestrator over the given collaborators.
    pub fn new(carts: Ca, orders: Or, ledger: L, payment: P, notifier: N) -> Self {
        Self {
            carts,
            orders,
            ledger,
            payment,
            notifier,
        }
    }

    /// Runs one checkout for a user to a terminal outcome.
    #[tracing::instrument(skip(self, shipping_address))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        shipping_address: &str,
    ) -> Result<CheckoutOutcome> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        // 1. Fetch the cart. Nothing has been mutated yet, so an empty
        // cart needs no compensation.
        let cart = self.carts.get_cart(user_id).await?;
        if cart.is_empty() {
            return Ok(CheckoutOutcome::failure(None, "Cart is empty"));
        }

        // 2. Create the order. Faults here propagate unmodified; there is
        // still nothing to compensate.
        let order = self
            .orders
            .create_order(user_id, &cart, shipping_address)
            .await?;
        let order_id = order.order_id;

        // 3. Reserve each item in cart order, strictly sequentially. The
        // intent list records what must be released on failure.
        let mut reserved: Vec<ReservedItem> = Vec::new();
        for item in &cart.items {
            let key = item.sku();
            match self.ledger.reserve(&key, item.quantity).await {
                Ok(outcome) if outcome.is_reserved() => {
                    reserved.push(ReservedItem {
                        key,
                        quantity: item.quantity,
                    });
                }
                Ok(outcome) => {
                    let reason = outcome
                        .failure_message()
                        .unwrap_or_else(|| "Insufficient inventory".to_string());
                    tracing::warn!(%key, %reason, "reserve rejected");
                    return Ok(self
                        .compensate_and_fail(order_id, user_id, &reserved, reason, started)
                        .await);
                }
                Err(e) => {
                    tracing::warn!(%key, error = %e, "reserve failed");
                    return Ok(self
                        .compensate_and_fail(order_id, user_id, &reserved, e.to_string(), started)
                        .await);
                }
            }
        }

        // 4. Charge the payment gateway.
        if !self
            .payment
            .process_payment(order_id, order.total_amount)
            .await
        {
            tracing::info!(%order_id, "payment failed, releasing reservations");
            return Ok(self
                .compensate_and_fail(order_id, user_id, &reserved, "Payment failed", started)
                .await);
        }

        // 5. Confirm every reservation. There is no reverse-confirm: items
        // confirmed before a failing one stay deducted, and the release in
        // compensation clamps to whatever is still reserved.
        for item in &reserved {
            if let Err(e) = self.ledger.confirm(&item.key, item.quantity).await {
                tracing::error!(%order_id, key = %item.key, error = %e, "confirm failed");
                return Ok(self
                    .compensate_and_fail(
                        order_id,
                        user_id,
                        &reserved,
                        format!("Inventory confirm failed: {e}"),
                        started,
                    )
                    .await);
            }
        }

        // 6. Terminal success. Payment and stock are settled; everything
        // from here is best-effort and must not fail the checkout.
        if let Err(e) = self
            .orders
            .update_status(order_id, OrderStatus::Paid, PaymentStatus::Paid)
            .await
        {
            tracing::error!(%order_id, error = %e, "failed to mark order paid");
        }
        if let Err(e) = self.carts.clear_cart(user_id).await {
            tracing::warn!(%user_id, error = %e, "failed to clear cart");
        }
        self.notify(order_id, user_id, true).await;

        let order = match self.orders.get_order(order_id).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "failed to reload order detail");
                order
            }
        };

        metrics::counter!("checkout_completed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(%order_id, %user_id, "checkout completed");
        Ok(CheckoutOutcome::success(order_id, order))
    }

    /// Shared terminal failure path: release everything in the intent
    /// list, mark the order failed, clear the cart, notify. Each step is
    /// wrapped so its own failure is logged and never masks `reason`.
    async fn compensate_and_fail(
        &self,
        order_id: common::OrderId,
        user_id: UserId,
        reserved: &[ReservedItem],
        reason: impl Into<String>,
        started: Instant,
    ) -> CheckoutOutcome {
        let reason = reason.into();

        for item in reserved {
            if let Err(e) = self.ledger.release(&item.key, item.quantity).await {
                tracing::error!(key = %item.key, error = %e, "failed to release reservation");
            }
        }

        if let Err(e) = self
            .orders
            .update_status(order_id, OrderStatus::Failed, PaymentStatus::Failed)
            .await
        {
            tracing::error!(%order_id, error = %e, "failed to mark order failed");
        }

        if let Err(e) = self.carts.clear_cart(user_id).await {
            tracing::warn!(%user_id, error = %e, "failed to clear cart");
        }

        self.notify(order_id, user_id, false).await;

        metrics::counter!("checkout_failed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::warn!(%order_id, %reason, "checkout failed");
        CheckoutOutcome::failure(Some(order_id), reason)
    }

    async fn notify(&self, order_id: common::OrderId, user_id: UserId, success: bool) {
        if let Err(e) = self
            .notifier
            .send_order_confirmation(order_id, user_id, success)
            .await
        {
            tracing::warn!(%order_id, error = %e, "failed to send order notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;
    use crate::services::cart::{CartItem, InMemoryCartService};
    use crate::services::notification::InMemoryNotificationSender;
    use crate::services::order::InMemoryOrderService;
    use crate::services::payment::StubPaymentGateway;
    use async_trait::async_trait;
    use common::Money;
    use inventory::{
        InMemoryInventoryCache, InMemoryInventoryStore, InMemorySkuMutex, InventoryError,
        InventoryLedger, ReserveOutcome, SkuMutex,
    };

    type TestLedger =
        InventoryLedger<InMemoryInventoryStore, InMemorySkuMutex, InMemoryInventoryCache>;

    struct TestHarness {
        orchestrator: CheckoutOrchestrator<
            InMemoryCartService,
            InMemoryOrderService,
            TestLedger,
            StubPaymentGateway,
            InMemoryNotificationSender,
        >,
        carts: InMemoryCartService,
        orders: InMemoryOrderService,
        ledger: TestLedger,
        payment: StubPaymentGateway,
        notifier: InMemoryNotificationSender,
        mutex: InMemorySkuMutex,
    }

    impl TestHarness {
        fn new() -> Self {
            let mutex = InMemorySkuMutex::new();
            let ledger = InventoryLedger::new(
                InMemoryInventoryStore::new(),
                mutex.clone(),
                InMemoryInventoryCache::new(),
            );
            let carts = InMemoryCartService::new();
            let orders = InMemoryOrderService::new();
            let payment = StubPaymentGateway::new();
            let notifier = InMemoryNotificationSender::new();

            let orchestrator = CheckoutOrchestrator::new(
                carts.clone(),
                orders.clone(),
                ledger.clone(),
                payment.clone(),
                notifier.clone(),
            );

            Self {
                orchestrator,
                carts,
                orders,
                ledger,
                payment,
                notifier,
                mutex,
            }
        }

        async fn seed_stock(&self, product: &str, merchant: i32, qty: u32) -> SkuKey {
            let key = SkuKey::new(product, merchant);
            self.ledger.create(&key, qty).await.unwrap();
            key
        }

        async fn counters(&self, key: &SkuKey) -> (u32, u32) {
            let record = self.ledger.fetch(key).await.unwrap();
            (record.available_qty, record.reserved_qty)
        }
    }

    fn user() -> UserId {
        UserId::new(1)
    }

    #[tokio::test]
    async fn happy_path_pays_confirms_and_clears() {
        let h = TestHarness::new();
        let key_a = h.seed_stock("P-A", 7, 10).await;
        let key_b = h.seed_stock("P-B", 7, 5).await;
        h.carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-B", 7, 1, Money::from_cents(2500)),
            ],
        );

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(outcome.is_success());
        let order_id = outcome.order_id().unwrap();

        // Permanent deduction, nothing left reserved.
        assert_eq!(h.counters(&key_a).await, (8, 0));
        assert_eq!(h.counters(&key_b).await, (4, 0));

        let order = h.orders.get_order(order_id).await.unwrap();
        assert_eq!(order.order_status, OrderStatus::Paid);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.total_amount.cents(), 4500);
        assert_eq!(h.payment.last_charge(), Some((order_id, order.total_amount)));

        assert!(!h.carts.has_cart(user()));
        assert_eq!(h.notifier.sent(), vec![(order_id, user(), true)]);
    }

    #[tokio::test]
    async fn empty_cart_fails_fast_without_an_order() {
        let h = TestHarness::new();
        h.carts.set_cart(user(), vec![]);

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.order_id(), None);
        assert_eq!(outcome.failure_reason(), Some("Cart is empty"));
        assert_eq!(h.orders.order_count(), 0);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_cart_propagates_before_any_mutation() {
        let h = TestHarness::new();

        let result = h.orchestrator.checkout(user(), "1 Main St").await;
        assert!(matches!(result, Err(CheckoutError::CartNotFound(_))));
        assert_eq!(h.orders.order_count(), 0);
    }

    #[tokio::test]
    async fn insufficient_second_item_releases_the_first() {
        let h = TestHarness::new();
        let key_a = h.seed_stock("P-A", 7, 10).await;
        let key_b = h.seed_stock("P-B", 7, 0).await;
        h.carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-B", 7, 1, Money::from_cents(2500)),
            ],
        );

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            outcome.failure_reason(),
            Some("Insufficient inventory: available=0, requested=1")
        );

        // A back to its original state, B untouched.
        assert_eq!(h.counters(&key_a).await, (10, 0));
        assert_eq!(h.counters(&key_b).await, (0, 0));

        let order_id = outcome.order_id().unwrap();
        let order = h.orders.get_order(order_id).await.unwrap();
        assert_eq!(order.order_status, OrderStatus::Failed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);

        assert!(!h.carts.has_cart(user()));
        assert_eq!(h.notifier.sent(), vec![(order_id, user(), false)]);
        assert_eq!(h.payment.charge_count(), 0);
    }

    #[tokio::test]
    async fn unknown_sku_in_cart_compensates() {
        let h = TestHarness::new();
        let key_a = h.seed_stock("P-A", 7, 10).await;
        h.carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-MISSING", 7, 1, Money::from_cents(100)),
            ],
        );

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert!(
            outcome
                .failure_reason()
                .unwrap()
                .contains("Inventory not found")
        );
        assert_eq!(h.counters(&key_a).await, (10, 0));
    }

    #[tokio::test]
    async fn payment_decline_releases_everything() {
        let h = TestHarness::new();
        let key_a = h.seed_stock("P-A", 7, 10).await;
        let key_b = h.seed_stock("P-B", 7, 5).await;
        h.carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-B", 7, 1, Money::from_cents(2500)),
            ],
        );
        h.payment.set_decline_all(true);

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.failure_reason(), Some("Payment failed"));
        assert_eq!(h.counters(&key_a).await, (10, 0));
        assert_eq!(h.counters(&key_b).await, (5, 0));

        let order = h.orders.get_order(outcome.order_id().unwrap()).await.unwrap();
        assert_eq!(order.order_status, OrderStatus::Failed);
        assert!(!h.carts.has_cart(user()));
    }

    #[tokio::test]
    async fn locked_sku_fails_the_step_and_compensates() {
        let h = TestHarness::new();
        let key_a = h.seed_stock("P-A", 7, 10).await;
        let key_b = h.seed_stock("P-B", 7, 5).await;
        h.carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-B", 7, 1, Money::from_cents(2500)),
            ],
        );

        // Another holder owns B's lease; the saga does not retry.
        let _held = h.mutex.acquire(&key_b).await.unwrap();

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert!(
            outcome
                .failure_reason()
                .unwrap()
                .contains("Could not acquire inventory lock")
        );
        assert_eq!(h.counters(&key_a).await, (10, 0));
    }

    #[tokio::test]
    async fn compensation_failures_do_not_mask_the_reason() {
        let h = TestHarness::new();
        h.seed_stock("P-A", 7, 10).await;
        h.carts.set_cart(
            user(),
            vec![CartItem::new("P-A", 7, 2, Money::from_cents(1000))],
        );
        h.payment.set_decline_all(true);
        h.orders.set_fail_on_update(true);
        h.carts.set_fail_on_clear(true);
        h.notifier.set_fail_on_send(true);

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();

        // Every compensation step failed, yet the original reason survives.
        assert_eq!(outcome.failure_reason(), Some("Payment failed"));
        assert!(h.carts.has_cart(user()));
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_checkout() {
        let h = TestHarness::new();
        h.seed_stock("P-A", 7, 10).await;
        h.carts.set_cart(
            user(),
            vec![CartItem::new("P-A", 7, 1, Money::from_cents(1000))],
        );
        h.notifier.set_fail_on_send(true);

        let outcome = h.orchestrator.checkout(user(), "1 Main St").await.unwrap();
        assert!(outcome.is_success());
        assert!(h.notifier.sent().is_empty());
    }

    /// Ledger wrapper that fails confirms for one SKU, to exercise the
    /// partial-confirm gap.
    struct FailConfirmOn<L> {
        inner: L,
        fail_key: SkuKey,
    }

    #[async_trait]
    impl<L: StockLedger> StockLedger for FailConfirmOn<L> {
        async fn reserve(
            &self,
            key: &SkuKey,
            quantity: u32,
        ) -> std::result::Result<ReserveOutcome, InventoryError> {
            self.inner.reserve(key, quantity).await
        }

        async fn confirm(
            &self,
            key: &SkuKey,
            quantity: u32,
        ) -> std::result::Result<(), InventoryError> {
            if *key == self.fail_key {
                return Err(InventoryError::InsufficientReservation {
                    key: key.clone(),
                    reserved: 0,
                    requested: quantity,
                });
            }
            self.inner.confirm(key, quantity).await
        }

        async fn release(
            &self,
            key: &SkuKey,
            quantity: u32,
        ) -> std::result::Result<(), InventoryError> {
            self.inner.release(key, quantity).await
        }
    }

    #[tokio::test]
    async fn confirm_failure_compensates_but_cannot_unconfirm() {
        let mutex = InMemorySkuMutex::new();
        let ledger = InventoryLedger::new(
            InMemoryInventoryStore::new(),
            mutex.clone(),
            InMemoryInventoryCache::new(),
        );
        let key_a = SkuKey::new("P-A", 7);
        let key_b = SkuKey::new("P-B", 7);
        ledger.create(&key_a, 10).await.unwrap();
        ledger.create(&key_b, 5).await.unwrap();

        let carts = InMemoryCartService::new();
        let orders = InMemoryOrderService::new();
        let payment = StubPaymentGateway::new();
        let notifier = InMemoryNotificationSender::new();
        carts.set_cart(
            user(),
            vec![
                CartItem::new("P-A", 7, 2, Money::from_cents(1000)),
                CartItem::new("P-B", 7, 1, Money::from_cents(2500)),
            ],
        );

        let orchestrator = CheckoutOrchestrator::new(
            carts.clone(),
            orders.clone(),
            FailConfirmOn {
                inner: ledger.clone(),
                fail_key: key_b.clone(),
            },
            payment.clone(),
            notifier.clone(),
        );

        let outcome = orchestrator.checkout(user(), "1 Main St").await.unwrap();

        assert!(!outcome.is_success());
        assert!(
            outcome
                .failure_reason()
                .unwrap()
                .starts_with("Inventory confirm failed")
        );

        // A was already confirmed: its deduction is permanent, the release
        // for A clamped to zero. B's reservation was fully released.
        let a = ledger.fetch(&key_a).await.unwrap();
        assert_eq!((a.available_qty, a.reserved_qty), (8, 0));
        let b = ledger.fetch(&key_b).await.unwrap();
        assert_eq!((b.available_qty, b.reserved_qty), (5, 0));

        // The order still reaches a terminal failed state even though
        // payment went through; the mismatch is reported, not corrected.
        let order = orders.get_order(outcome.order_id().unwrap()).await.unwrap();
        assert_eq!(order.order_status, OrderStatus::Failed);
        assert_eq!(payment.charge_count(), 1);
    }
}
