//! Collaborator boundaries consumed by the checkout orchestrator.

pub mod cart;
pub mod notification;
pub mod order;
pub mod payment;
pub mod stock;

pub use cart::{Cart, CartItem, CartService, InMemoryCartService};
pub use notification::{InMemoryNotificationSender, NotificationSender};
pub use order::{InMemoryOrderService, Order, OrderItem, OrderService, OrderStatus, PaymentStatus};
pub use payment::{PaymentGateway, StubPaymentGateway};
pub use stock::StockLedger;
