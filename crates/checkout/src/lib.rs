//! Checkout saga over the inventory reservation engine.
//!
//! A checkout walks cart → order → reserve → pay → confirm, one step at a
//! time. Failures after the order exists are compensated by releasing every
//! reservation taken so far and parking the order in a terminal failed
//! state; there is no distributed transaction and no retry loop.
//!
//! The [`CheckoutOrchestrator`] owns the flow; the traits in [`services`]
//! are the seams it calls through.

pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod services;

pub use error::{CheckoutError, Result};
pub use orchestrator::CheckoutOrchestrator;
pub use outcome::CheckoutOutcome;
pub use services::{
    Cart, CartItem, CartService, InMemoryCartService, InMemoryNotificationSender,
    InMemoryOrderService, NotificationSender, Order, OrderItem, OrderService, OrderStatus,
    PaymentGateway, PaymentStatus, StockLedger, StubPaymentGateway,
};
