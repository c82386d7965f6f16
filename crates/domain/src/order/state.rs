//! Order status machine.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;

/// The status of an order in its fulfillment lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │            │             │
///    │            │             └──► Failed
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order has been placed, not yet picked up for preparation.
    #[default]
    Pending,

    /// Order is being prepared by the producer.
    Processing,

    /// A deliverer accepted the order and a delivery is in flight.
    Shipped,

    /// Goods reached the consumer (terminal state).
    Delivered,

    /// Order was cancelled before shipping (terminal state).
    Cancelled,

    /// Delivery failed and the order could not be fulfilled (terminal state).
    Failed,
}

/// The one valid transition graph for orders.
///
/// Cancellation is only reachable before a delivery is bound; once an order
/// ships, the only exits are Delivered and Failed.
pub static ORDER_LIFECYCLE: Lifecycle<OrderStatus> = Lifecycle::new(
    &[
        (OrderStatus::Pending, OrderStatus::Processing),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Processing, OrderStatus::Cancelled),
        (OrderStatus::Shipped, OrderStatus::Delivered),
        (OrderStatus::Shipped, OrderStatus::Failed),
    ],
    &[
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ],
);

impl OrderStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        ORDER_LIFECYCLE.is_terminal(*self)
    }

    /// Returns true if the order is still waiting for a deliverer.
    pub fn is_open_for_assignment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if the consumer can still cancel.
    pub fn can_cancel(&self) -> bool {
        ORDER_LIFECYCLE.can_transition(*self, OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}
