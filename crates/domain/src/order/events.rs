//! Events emitted by the order aggregate.

use chrono::{DateTime, Utc};
use common::{Actor, AggregateId, UserId};
use serde::{Deserialize, Serialize};

use super::value_objects::{DeliveryInfo, Money, OrderItem, PaymentMethod, PaymentOutcome};
use crate::aggregate::DomainEvent;

/// All events that can happen to an order.
///
/// Every event carries the actor that caused it; the full status history of
/// an order is just its event stream replayed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// A consumer placed a new order.
    OrderPlaced {
        order_id: AggregateId,
        consumer_id: UserId,
        items: Vec<OrderItem>,
        total: Money,
        delivery_info: DeliveryInfo,
        payment_method: PaymentMethod,
        placed_by: Actor,
        placed_at: DateTime<Utc>,
    },

    /// The order moved into preparation.
    OrderProcessing {
        updated_by: Actor,
        updated_at: DateTime<Utc>,
    },

    /// A delivery was bound to the order; exactly one may ever bind.
    OrderShipped {
        delivery_id: AggregateId,
        deliverer_id: UserId,
        updated_by: Actor,
        updated_at: DateTime<Utc>,
    },

    /// The goods reached the consumer.
    OrderDelivered {
        updated_by: Actor,
        updated_at: DateTime<Utc>,
    },

    /// The order was cancelled before shipping.
    OrderCancelled {
        reason: String,
        cancelled_by: Actor,
        cancelled_at: DateTime<Utc>,
    },

    /// The bound delivery failed and the order could not be fulfilled.
    OrderFailed {
        reason: String,
        updated_by: Actor,
        updated_at: DateTime<Utc>,
    },

    /// A payment attempt was recorded against the order.
    PaymentRecorded {
        amount: Money,
        method: PaymentMethod,
        outcome: PaymentOutcome,
        recorded_by: Actor,
        recorded_at: DateTime<Utc>,
    },
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced { .. } => "OrderPlaced",
            OrderEvent::OrderProcessing { .. } => "OrderProcessing",
            OrderEvent::OrderShipped { .. } => "OrderShipped",
            OrderEvent::OrderDelivered { .. } => "OrderDelivered",
            OrderEvent::OrderCancelled { .. } => "OrderCancelled",
            OrderEvent::OrderFailed { .. } => "OrderFailed",
            OrderEvent::PaymentRecorded { .. } => "PaymentRecorded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_stable() {
        let actor = Actor::admin(UserId::new());
        let event = OrderEvent::OrderCancelled {
            reason: "changed my mind".to_string(),
            cancelled_by: actor,
            cancelled_at: Utc::now(),
        };
        assert_eq!(event.event_type(), "OrderCancelled");
    }

    #[test]
    fn events_round_trip_through_json() {
        let actor = Actor::admin(UserId::new());
        let event = OrderEvent::OrderShipped {
            delivery_id: AggregateId::new(),
            deliverer_id: UserId::new(),
            updated_by: actor,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        let back: OrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
