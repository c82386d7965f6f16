//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Actor, AggregateId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::lifecycle::TransitionError;

use super::state::{ORDER_LIFECYCLE, OrderStatus};
use super::value_objects::{
    DeliveryInfo, Money, OrderItem, PaymentMethod, PaymentOutcome, StatusEntry,
};
use super::{OrderError, OrderEvent};

/// A recorded payment attempt against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: Money,
    pub method: PaymentMethod,
    pub outcome: PaymentOutcome,
}

/// Order aggregate root.
///
/// Carries the order through its lifecycle from placement to a terminal
/// state, and owns the authoritative answer to "does this order already
/// have a delivery". Binding the delivery is a plain event append, so the
/// store's version check makes concurrent accepts lose cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// Consumer who placed the order.
    consumer_id: Option<UserId>,

    /// Current status of the order.
    status: OrderStatus,

    /// Every status the order has passed through, in order.
    status_history: Vec<StatusEntry>,

    /// Priced order lines, frozen at placement.
    items: Vec<OrderItem>,

    /// Total amount of the order.
    total: Money,

    /// Where and how the order should be fulfilled.
    delivery_info: Option<DeliveryInfo>,

    /// How the consumer pays.
    payment_method: Option<PaymentMethod>,

    /// The delivery bound to this order, if one has been accepted.
    active_delivery: Option<AggregateId>,

    /// The deliverer executing the bound delivery.
    deliverer_id: Option<UserId>,

    /// Payment attempts recorded so far.
    payments: Vec<PaymentRecord>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced {
                order_id,
                consumer_id,
                items,
                total,
                delivery_info,
                payment_method,
                placed_by,
                placed_at,
            } => {
                self.id = Some(order_id);
                self.consumer_id = Some(consumer_id);
                self.items = items;
                self.total = total;
                self.delivery_info = Some(delivery_info);
                self.payment_method = Some(payment_method);
                self.record_status(OrderStatus::Pending, placed_at, placed_by);
            }
            OrderEvent::OrderProcessing {
                updated_by,
                updated_at,
            } => {
                self.record_status(OrderStatus::Processing, updated_at, updated_by);
            }
            OrderEvent::OrderShipped {
                delivery_id,
                deliverer_id,
                updated_by,
                updated_at,
            } => {
                self.active_delivery = Some(delivery_id);
                self.deliverer_id = Some(deliverer_id);
                self.record_status(OrderStatus::Shipped, updated_at, updated_by);
            }
            OrderEvent::OrderDelivered {
                updated_by,
                updated_at,
            } => {
                self.record_status(OrderStatus::Delivered, updated_at, updated_by);
            }
            OrderEvent::OrderCancelled {
                cancelled_by,
                cancelled_at,
                ..
            } => {
                self.record_status(OrderStatus::Cancelled, cancelled_at, cancelled_by);
            }
            OrderEvent::OrderFailed {
                updated_by,
                updated_at,
                ..
            } => {
                self.record_status(OrderStatus::Failed, updated_at, updated_by);
            }
            OrderEvent::PaymentRecorded {
                amount,
                method,
                outcome,
                ..
            } => {
                self.payments.push(PaymentRecord {
                    amount,
                    method,
                    outcome,
                });
            }
        }
    }
}

impl SnapshotCapable for Order {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Order {
    /// Returns the consumer who placed the order.
    pub fn consumer_id(&self) -> Option<UserId> {
        self.consumer_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the status history, oldest first.
    pub fn status_history(&self) -> &[StatusEntry] {
        &self.status_history
    }

    /// Returns the priced order lines.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the delivery routing for the order.
    pub fn delivery_info(&self) -> Option<&DeliveryInfo> {
        self.delivery_info.as_ref()
    }

    /// Returns the payment method chosen at placement.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns the delivery bound to this order, if any.
    pub fn active_delivery(&self) -> Option<AggregateId> {
        self.active_delivery
    }

    /// Returns the deliverer executing the bound delivery.
    pub fn deliverer_id(&self) -> Option<UserId> {
        self.deliverer_id
    }

    /// Returns the recorded payment attempts.
    pub fn payments(&self) -> &[PaymentRecord] {
        &self.payments
    }

    /// Returns true if a recorded payment succeeded.
    pub fn is_paid(&self) -> bool {
        self.payments
            .iter()
            .any(|p| p.outcome == PaymentOutcome::Succeeded)
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the order is still waiting for a deliverer.
    pub fn is_open_for_assignment(&self) -> bool {
        self.status.is_open_for_assignment() && self.active_delivery.is_none()
    }

    fn record_status(&mut self, status: OrderStatus, at: DateTime<Utc>, updated_by: Actor) {
        self.status = status;
        self.status_history.push(StatusEntry::new(status, at, updated_by));
    }

    fn check_transition(&self, to: OrderStatus) -> Result<(), OrderError> {
        ORDER_LIFECYCLE
            .check(self.status, to)
            .map_err(OrderError::from)
    }

    fn require_placed(&self) -> Result<(), OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        Ok(())
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order.
    ///
    /// Items must already be priced against the catalog. The order starts in
    /// Pending and immediately advances to Processing, so a freshly placed
    /// order is visible to deliverers without a separate producer step.
    pub fn place(
        &self,
        order_id: AggregateId,
        actor: Actor,
        consumer_id: UserId,
        items: Vec<OrderItem>,
        delivery_info: DeliveryInfo,
        payment_method: PaymentMethod,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }
        if !actor.acts_as(consumer_id) {
            return Err(OrderError::NotAuthorized {
                action: "place order",
            });
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.to_string(),
                });
            }
        }
        // Pickup methods carry the pickup point in the address field; only
        // home delivery needs a consumer address to route to.
        if delivery_info.method.requires_deliverer() && delivery_info.address.trim().is_empty() {
            return Err(OrderError::MissingAddress);
        }

        let total = items
            .iter()
            .fold(Money::zero(), |acc, item| acc.add(item.line_total()));
        let now = Utc::now();

        Ok(vec![
            OrderEvent::OrderPlaced {
                order_id,
                consumer_id,
                items,
                total,
                delivery_info,
                payment_method,
                placed_by: actor,
                placed_at: now,
            },
            OrderEvent::OrderProcessing {
                updated_by: actor,
                updated_at: now,
            },
        ])
    }

    /// Binds an accepted delivery to the order.
    ///
    /// At most one delivery ever binds. A second bind attempt fails here if
    /// the first is already applied, or at append time via the version check
    /// if the two race.
    pub fn bind_delivery(
        &self,
        actor: Actor,
        delivery_id: AggregateId,
        deliverer_id: UserId,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.require_placed()?;
        if let Some(existing) = self.active_delivery {
            return Err(OrderError::DeliveryAlreadyBound {
                delivery_id: existing,
            });
        }
        self.check_transition(OrderStatus::Shipped)?;

        Ok(vec![OrderEvent::OrderShipped {
            delivery_id,
            deliverer_id,
            updated_by: actor,
            updated_at: Utc::now(),
        }])
    }

    /// Marks the order as delivered.
    ///
    /// Only meaningful once a delivery is bound; driven by the delivery
    /// completing.
    pub fn mark_delivered(&self, actor: Actor) -> Result<Vec<OrderEvent>, OrderError> {
        self.require_placed()?;
        self.check_transition(OrderStatus::Delivered)?;

        Ok(vec![OrderEvent::OrderDelivered {
            updated_by: actor,
            updated_at: Utc::now(),
        }])
    }

    /// Marks the order as failed because its bound delivery failed.
    pub fn mark_failed(
        &self,
        actor: Actor,
        reason: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.require_placed()?;
        self.check_transition(OrderStatus::Failed)?;

        Ok(vec![OrderEvent::OrderFailed {
            reason: reason.into(),
            updated_by: actor,
            updated_at: Utc::now(),
        }])
    }

    /// Cancels the order.
    ///
    /// Only the consumer who placed the order (or an admin) may cancel, and
    /// only before a delivery is bound.
    pub fn cancel(
        &self,
        actor: Actor,
        reason: impl Into<String>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.require_placed()?;
        let consumer_id = self.consumer_id.ok_or(OrderError::NotPlaced)?;
        if !actor.acts_as(consumer_id) {
            return Err(OrderError::NotAuthorized {
                action: "cancel order",
            });
        }
        self.check_transition(OrderStatus::Cancelled)?;

        Ok(vec![OrderEvent::OrderCancelled {
            reason: reason.into(),
            cancelled_by: actor,
            cancelled_at: Utc::now(),
        }])
    }

    /// Records a payment attempt against the order.
    pub fn record_payment(
        &self,
        actor: Actor,
        amount: Money,
        method: PaymentMethod,
        outcome: PaymentOutcome,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.require_placed()?;
        if matches!(self.status, OrderStatus::Cancelled | OrderStatus::Failed) {
            return Err(OrderError::Transition(TransitionError::Terminal {
                state: self.status,
            }));
        }
        if amount.cents() <= 0 {
            return Err(OrderError::InvalidAmount {
                cents: amount.cents(),
            });
        }

        Ok(vec![OrderEvent::PaymentRecorded {
            amount,
            method,
            outcome,
            recorded_by: actor,
            recorded_at: Utc::now(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::super::{DeliveryMethod, ProductId};
    use super::*;

    fn priced_item(sku: &str, quantity: u32, cents: i64) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(sku),
            product_name: sku.to_string(),
            quantity,
            unit_price: Money::from_cents(cents),
        }
    }

    fn placed_order(consumer: Actor) -> Order {
        let mut order = Order::default();
        let events = order
            .place(
                AggregateId::new(),
                consumer,
                consumer.user_id,
                vec![priced_item("carrots-1kg", 2, 250)],
                DeliveryInfo::home_delivery("5 Lake Rd"),
                PaymentMethod::CashOnDelivery,
            )
            .unwrap();
        order.apply_events(events);
        order
    }

    fn consumer() -> Actor {
        Actor::consumer(UserId::new())
    }

    fn deliverer() -> Actor {
        Actor::deliverer(UserId::new())
    }

    #[test]
    fn place_prices_the_total_and_advances_to_processing() {
        let actor = consumer();
        let order = placed_order(actor);

        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.total(), Money::from_cents(500));
        assert_eq!(order.status_history().len(), 2);
        assert_eq!(order.status_history()[0].status, OrderStatus::Pending);
        assert!(order.is_open_for_assignment());
    }

    #[test]
    fn place_rejects_empty_items() {
        let actor = consumer();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            actor,
            actor.user_id,
            vec![],
            DeliveryInfo::home_delivery("5 Lake Rd"),
            PaymentMethod::CashOnDelivery,
        );
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn place_rejects_zero_quantity() {
        let actor = consumer();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            actor,
            actor.user_id,
            vec![priced_item("carrots-1kg", 0, 250)],
            DeliveryInfo::home_delivery("5 Lake Rd"),
            PaymentMethod::CashOnDelivery,
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn place_rejects_blank_address() {
        let actor = consumer();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            actor,
            actor.user_id,
            vec![priced_item("carrots-1kg", 1, 250)],
            DeliveryInfo::home_delivery("   "),
            PaymentMethod::CashOnDelivery,
        );
        assert!(matches!(result, Err(OrderError::MissingAddress)));
    }

    #[test]
    fn pickup_order_places_without_an_address() {
        let actor = consumer();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            actor,
            actor.user_id,
            vec![priced_item("carrots-1kg", 1, 250)],
            DeliveryInfo::pickup(DeliveryMethod::FarmPickup, "  "),
            PaymentMethod::CashOnDelivery,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn place_rejects_acting_for_someone_else() {
        let actor = consumer();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            actor,
            UserId::new(),
            vec![priced_item("carrots-1kg", 1, 250)],
            DeliveryInfo::home_delivery("5 Lake Rd"),
            PaymentMethod::CashOnDelivery,
        );
        assert!(matches!(result, Err(OrderError::NotAuthorized { .. })));
    }

    #[test]
    fn admin_can_place_for_a_consumer() {
        let admin = Actor::admin(UserId::new());
        let consumer_id = UserId::new();
        let order = Order::default();
        let result = order.place(
            AggregateId::new(),
            admin,
            consumer_id,
            vec![priced_item("carrots-1kg", 1, 250)],
            DeliveryInfo::home_delivery("5 Lake Rd"),
            PaymentMethod::CashOnDelivery,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn bind_delivery_moves_to_shipped() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let courier = deliverer();

        let events = order
            .bind_delivery(courier, AggregateId::new(), courier.user_id)
            .unwrap();
        order.apply_events(events);

        assert_eq!(order.status(), OrderStatus::Shipped);
        assert!(order.active_delivery().is_some());
        assert!(!order.is_open_for_assignment());
    }

    #[test]
    fn second_bind_is_rejected() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let courier = deliverer();
        let events = order
            .bind_delivery(courier, AggregateId::new(), courier.user_id)
            .unwrap();
        order.apply_events(events);

        let other = deliverer();
        let result = order.bind_delivery(other, AggregateId::new(), other.user_id);
        assert!(matches!(
            result,
            Err(OrderError::DeliveryAlreadyBound { .. })
        ));
    }

    #[test]
    fn cancel_before_shipping_succeeds() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let events = order.cancel(actor, "changed my mind").unwrap();
        order.apply_events(events);
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn cancel_after_shipping_is_rejected() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let courier = deliverer();
        let events = order
            .bind_delivery(courier, AggregateId::new(), courier.user_id)
            .unwrap();
        order.apply_events(events);

        let result = order.cancel(actor, "too late");
        assert!(matches!(result, Err(OrderError::Transition(_))));
    }

    #[test]
    fn cancel_by_another_consumer_is_rejected() {
        let actor = consumer();
        let order = placed_order(actor);
        let stranger = consumer();
        let result = order.cancel(stranger, "not mine");
        assert!(matches!(result, Err(OrderError::NotAuthorized { .. })));
    }

    #[test]
    fn delivered_is_terminal() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let courier = deliverer();
        order.apply_events(
            order
                .bind_delivery(courier, AggregateId::new(), courier.user_id)
                .unwrap(),
        );
        order.apply_events(order.mark_delivered(courier).unwrap());

        assert_eq!(order.status(), OrderStatus::Delivered);
        assert!(order.is_terminal());
        assert!(order.mark_failed(courier, "late").is_err());
    }

    #[test]
    fn failed_delivery_fails_the_order() {
        let actor = consumer();
        let mut order = placed_order(actor);
        let courier = deliverer();
        order.apply_events(
            order
                .bind_delivery(courier, AggregateId::new(), courier.user_id)
                .unwrap(),
        );
        order.apply_events(order.mark_failed(courier, "vehicle breakdown").unwrap());

        assert_eq!(order.status(), OrderStatus::Failed);
        assert!(order.is_terminal());
    }

    #[test]
    fn payment_recorded_and_queried() {
        let actor = consumer();
        let mut order = placed_order(actor);
        assert!(!order.is_paid());

        let events = order
            .record_payment(
                actor,
                order.total(),
                PaymentMethod::CashOnDelivery,
                PaymentOutcome::Succeeded,
            )
            .unwrap();
        order.apply_events(events);

        assert!(order.is_paid());
        assert_eq!(order.payments().len(), 1);
    }

    #[test]
    fn payment_rejected_on_cancelled_order() {
        let actor = consumer();
        let mut order = placed_order(actor);
        order.apply_events(order.cancel(actor, "no thanks").unwrap());

        let result = order.record_payment(
            actor,
            Money::from_cents(100),
            PaymentMethod::MobileMoney,
            PaymentOutcome::Succeeded,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_amount_payment_is_rejected() {
        let actor = consumer();
        let order = placed_order(actor);
        let result = order.record_payment(
            actor,
            Money::zero(),
            PaymentMethod::MobileMoney,
            PaymentOutcome::Succeeded,
        );
        assert!(matches!(result, Err(OrderError::InvalidAmount { .. })));
    }
}
