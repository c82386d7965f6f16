//! Notification collaborator trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AggregateId, UserId};

/// A notification pushed after a terminal transition.
///
/// Delivery is fire-and-forget: a failed notification is logged and dropped,
/// never rolled back into the transition that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    OrderDelivered {
        order_id: AggregateId,
        consumer_id: UserId,
    },
    OrderFailed {
        order_id: AggregateId,
        consumer_id: UserId,
        reason: String,
    },
    OrderCancelled {
        order_id: AggregateId,
        consumer_id: UserId,
        reason: String,
    },
}

impl Notification {
    /// Returns the order this notification concerns.
    pub fn order_id(&self) -> AggregateId {
        match self {
            Notification::OrderDelivered { order_id, .. } => *order_id,
            Notification::OrderFailed { order_id, .. } => *order_id,
            Notification::OrderCancelled { order_id, .. } => *order_id,
        }
    }
}

/// Trait for pushing notifications to consumers.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends a notification. Errors are reported as plain strings since the
    /// caller only ever logs them.
    async fn notify(&self, notification: Notification) -> Result<(), String>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<Notification>,
    fail_on_notify: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on subsequent notify calls.
    pub fn set_fail_on_notify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_notify = fail;
    }

    /// Returns the notifications sent so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of notifications sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn notify(&self, notification: Notification) -> Result<(), String> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_notify {
            return Err("notification channel unavailable".to_string());
        }
        state.sent.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_notifications() {
        let service = InMemoryNotificationService::new();
        let notification = Notification::OrderDelivered {
            order_id: AggregateId::new(),
            consumer_id: UserId::new(),
        };
        service.notify(notification.clone()).await.unwrap();
        assert_eq!(service.sent(), vec![notification]);
    }

    #[tokio::test]
    async fn failure_injection() {
        let service = InMemoryNotificationService::new();
        service.set_fail_on_notify(true);
        let result = service
            .notify(Notification::OrderFailed {
                order_id: AggregateId::new(),
                consumer_id: UserId::new(),
                reason: "x".to_string(),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(service.sent_count(), 0);
    }
}
