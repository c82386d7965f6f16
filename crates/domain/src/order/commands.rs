//! Order commands.

use common::{AggregateId, UserId};

use super::{DeliveryInfo, Money, OrderItemRequest, PaymentMethod, PaymentOutcome};

/// Command to place a new order.
///
/// Items carry only product references and quantities; the service prices
/// them against the catalog.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The consumer the order is for.
    pub consumer_id: UserId,

    /// The requested order lines.
    pub items: Vec<OrderItemRequest>,

    /// Where and how the order should be fulfilled.
    pub delivery_info: DeliveryInfo,

    /// How the consumer pays.
    pub payment_method: PaymentMethod,
}

impl PlaceOrder {
    /// Creates a PlaceOrder command with a generated order ID.
    pub fn new(
        consumer_id: UserId,
        items: Vec<OrderItemRequest>,
        delivery_info: DeliveryInfo,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            order_id: AggregateId::new(),
            consumer_id,
            items,
            delivery_info,
            payment_method,
        }
    }
}

/// Command to cancel an order before it ships.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    /// The order to cancel.
    pub order_id: AggregateId,

    /// Why the order is being cancelled.
    pub reason: String,
}

impl CancelOrder {
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

/// Command to record a payment attempt against an order.
#[derive(Debug, Clone)]
pub struct RecordPayment {
    /// The order the payment is for.
    pub order_id: AggregateId,

    /// The amount that changed hands.
    pub amount: Money,

    /// How the payment was made.
    pub method: PaymentMethod,

    /// Whether the payment went through.
    pub outcome: PaymentOutcome,
}

impl RecordPayment {
    pub fn new(
        order_id: AggregateId,
        amount: Money,
        method: PaymentMethod,
        outcome: PaymentOutcome,
    ) -> Self {
        Self {
            order_id,
            amount,
            method,
            outcome,
        }
    }
}
