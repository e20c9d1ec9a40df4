//! Notification sender boundary.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{OrderId, UserId};

use crate::error::{CheckoutError, Result};

/// Trait for sending order confirmations.
///
/// Strictly best-effort: the saga logs and swallows every error from this
/// boundary, and never changes its outcome because a notification failed.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Notifies the user of a checkout result.
    async fn send_order_confirmation(
        &self,
        order_id: OrderId,
        user_id: UserId,
        success: bool,
    ) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<(OrderId, UserId, bool)>,
    fail_on_send: bool,
}

/// In-memory notification sender for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationSender {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationSender {
    /// Creates a new in-memory sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sender to fail on send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns all notifications sent so far.
    pub fn sent(&self) -> Vec<(OrderId, UserId, bool)> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationSender for InMemoryNotificationSender {
    async fn send_order_confirmation(
        &self,
        order_id: OrderId,
        user_id: UserId,
        success: bool,
    ) -> Result<()> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(CheckoutError::Notification(
                "Notification channel unavailable".to_string(),
            ));
        }
        state.sent.push((order_id, user_id, success));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_notifications() {
        let sender = InMemoryNotificationSender::new();
        let order_id = OrderId::new();
        let user_id = UserId::new(1);

        sender
            .send_order_confirmation(order_id, user_id, true)
            .await
            .unwrap();

        assert_eq!(sender.sent(), vec![(order_id, user_id, true)]);
    }

    #[tokio::test]
    async fn send_failure_injection() {
        let sender = InMemoryNotificationSender::new();
        sender.set_fail_on_send(true);

        let result = sender
            .send_order_confirmation(OrderId::new(), UserId::new(1), false)
            .await;
        assert!(matches!(result, Err(CheckoutError::Notification(_))));
        assert!(sender.sent().is_empty());
    }
}
