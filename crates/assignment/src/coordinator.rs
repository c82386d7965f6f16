//! Assignment coordinator matching open orders to deliverers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Actor, AggregateId};
use domain::{
    Aggregate, CancelOrder, CommandHandler, CompleteDelivery, Delivery, DeliveryError,
    DeliveryMethod, DeliveryService, DeliveryStatus, DomainError, FailDelivery, Location,
    OpenDelivery, Order, OrderError, OrderEvent, OrderStatus, UpdateDeliveryStatus,
};
use event_store::{EventQuery, EventStore, EventStoreError};

use crate::error::{AssignmentError, Result};
use crate::notification::{Notification, NotificationService};

/// Command to accept an open order for delivery.
#[derive(Debug, Clone)]
pub struct AcceptOrder {
    /// The order being accepted.
    pub order_id: AggregateId,

    /// Where the deliverer collects the goods.
    pub pickup_location: Location,

    /// When the handoff is expected, if known.
    pub estimated_time: Option<DateTime<Utc>>,
}

impl AcceptOrder {
    pub fn new(order_id: AggregateId, pickup_location: Location) -> Self {
        Self {
            order_id,
            pickup_location,
            estimated_time: None,
        }
    }

    pub fn with_estimated_time(mut self, at: DateTime<Utc>) -> Self {
        self.estimated_time = Some(at);
        self
    }
}

/// Coordinates the handoff of orders to deliverers.
///
/// Accepting is the one contended operation in the core: two deliverers can
/// race for the same order. The order's event stream is the arbiter — the
/// delivery is opened first, then bound to the order with an append
/// conditioned on the version the order was read at. Exactly one racer's
/// append lands; the loser's orphan delivery is compensated by failing it.
pub struct AssignmentCoordinator<S, N>
where
    S: EventStore,
    N: NotificationService,
{
    store: S,
    orders: CommandHandler<S, Order>,
    deliveries: DeliveryService<S>,
    notifier: N,
}

impl<S, N> AssignmentCoordinator<S, N>
where
    S: EventStore + Clone,
    N: NotificationService,
{
    /// Creates a new assignment coordinator.
    pub fn new(store: S, notifier: N) -> Self {
        let orders = CommandHandler::new(store.clone());
        let deliveries = DeliveryService::new(store.clone());
        Self {
            store,
            orders,
            deliveries,
            notifier,
        }
    }

    /// Returns the orders currently available for a deliverer to accept.
    ///
    /// An order qualifies when it requests home delivery, sits in Processing,
    /// and has no delivery bound. Rebuilt from the order streams so the
    /// answer always reflects committed state.
    #[tracing::instrument(skip(self))]
    pub async fn list_open_orders(&self) -> Result<Vec<Order>> {
        let envelopes = self
            .store
            .query_events(EventQuery::for_aggregate_type(Order::aggregate_type()))
            .await?;

        let mut orders: HashMap<AggregateId, Order> = HashMap::new();
        for envelope in envelopes {
            let event: OrderEvent = serde_json::from_value(envelope.payload)?;
            let order = orders.entry(envelope.aggregate_id).or_default();
            order.apply(event);
            order.set_version(envelope.version);
        }

        let mut open: Vec<Order> = orders
            .into_values()
            .filter(|order| {
                order.status() == OrderStatus::Processing
                    && order.active_delivery().is_none()
                    && order
                        .delivery_info()
                        .is_some_and(|info| info.method == DeliveryMethod::HomeDelivery)
            })
            .collect();
        open.sort_by_key(|order| order.id().map(|id| id.as_uuid()));
        Ok(open)
    }

    /// Accepts an open order for the acting deliverer. First accept wins.
    ///
    /// Protocol: read the order, open a fresh delivery, then bind it to the
    /// order at the version the order was read at. A concurrent accept makes
    /// the bind fail the version check; we re-read once to distinguish "lost
    /// the race" from an unrelated writer, then give up with a conflict. A
    /// delivery left unbound by a lost race is failed in place so it never
    /// shows up as active.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, deliverer = %actor.user_id))]
    pub async fn accept(&self, actor: Actor, cmd: AcceptOrder) -> Result<Delivery> {
        let order_id = cmd.order_id;
        let order = self
            .orders
            .load_existing(order_id)
            .await?
            .ok_or(AssignmentError::OrderNotFound(order_id))?;

        self.check_acceptable(&order)?;
        let delivery_location = order
            .delivery_info()
            .map(|info| {
                let location = Location::new(info.address.clone());
                match info.coordinates {
                    Some(point) => location.with_coordinates(point),
                    None => location,
                }
            })
            .ok_or(AssignmentError::NotHomeDelivery(order_id))?;

        // Open the delivery before touching the order; if the bind below
        // loses the race this aggregate is compensated, not reused.
        let mut open_cmd = OpenDelivery::new(
            order_id,
            actor.user_id,
            cmd.pickup_location,
            delivery_location,
        );
        if let Some(at) = cmd.estimated_time {
            open_cmd = open_cmd.with_estimated_time(at);
        }
        let delivery_id = open_cmd.delivery_id;
        let delivery = self
            .deliveries
            .open_delivery(actor, open_cmd)
            .await
            .map_err(AssignmentError::Domain)?
            .aggregate;

        match self.bind(actor, order, order_id, delivery_id).await {
            Ok(()) => {
                metrics::counter!("assignments_won_total").increment(1);
                tracing::info!(%delivery_id, "order accepted");
                Ok(delivery)
            }
            Err(err) => {
                metrics::counter!("assignments_lost_total").increment(1);
                self.compensate_orphan(actor, delivery_id).await;
                Err(err)
            }
        }
    }

    /// Moves a delivery to a new status, routing terminal targets through
    /// the operations that propagate to the order.
    pub async fn update_delivery_status(
        &self,
        actor: Actor,
        cmd: UpdateDeliveryStatus,
    ) -> Result<Delivery> {
        match cmd.new_status {
            DeliveryStatus::Delivered => {
                self.complete_delivery(actor, CompleteDelivery::new(cmd.delivery_id))
                    .await
            }
            DeliveryStatus::Failed => {
                let reason = cmd.note.unwrap_or_else(|| "marked failed".to_string());
                self.fail_delivery(actor, FailDelivery::new(cmd.delivery_id, reason))
                    .await
            }
            _ => {
                let result = self
                    .deliveries
                    .update_status(actor, cmd)
                    .await
                    .map_err(AssignmentError::Domain)?;
                Ok(result.aggregate)
            }
        }
    }

    /// Cancels an order and tells the consumer, removing it from the
    /// deliverable pool.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn cancel_order(&self, actor: Actor, cmd: CancelOrder) -> Result<Order> {
        let order_id = cmd.order_id;
        let reason = cmd.reason.clone();
        let order = self
            .orders
            .execute(order_id, actor, |order: &Order| {
                order.cancel(actor, cmd.reason)
            })
            .await?
            .aggregate;

        if let Some(consumer_id) = order.consumer_id() {
            self.send_notification(Notification::OrderCancelled {
                order_id,
                consumer_id,
                reason,
            })
            .await;
        }

        Ok(order)
    }

    /// Completes a delivery and pushes the order to Delivered.
    ///
    /// Retry-safe: a delivery that already landed in Delivered (a prior
    /// call that died before the order append) skips straight to the order
    /// side, and an order that already reflects the completion is left
    /// alone. A transient store error between the two appends is healed by
    /// calling again.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id))]
    pub async fn complete_delivery(
        &self,
        actor: Actor,
        cmd: CompleteDelivery,
    ) -> Result<Delivery> {
        let delivery_id = cmd.delivery_id;
        let existing = self
            .deliveries
            .get_delivery(delivery_id)
            .await
            .map_err(AssignmentError::Domain)?;

        let delivery = if existing.status() == DeliveryStatus::Delivered {
            self.ensure_deliverer(actor, &existing)?;
            existing
        } else {
            self.deliveries
                .complete_delivery(actor, cmd)
                .await
                .map_err(AssignmentError::Domain)?
                .aggregate
        };

        if let Some(order_id) = delivery.order_id() {
            let order = self.orders.load(order_id).await?;
            if order.active_delivery() == Some(delivery_id) && !order.is_terminal() {
                let order = self
                    .orders
                    .execute_loaded(order, order_id, actor, |order| {
                        order.mark_delivered(actor)
                    })
                    .await?
                    .aggregate;
                if let Some(consumer_id) = order.consumer_id() {
                    self.send_notification(Notification::OrderDelivered {
                        order_id,
                        consumer_id,
                    })
                    .await;
                }
            }
        }

        Ok(delivery)
    }

    /// Fails a delivery and, if it was the order's bound delivery, pushes
    /// the order to Failed.
    ///
    /// Retry-safe the same way `complete_delivery` is: an already-failed
    /// delivery skips to the order side, an already-terminal order is left
    /// alone.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id))]
    pub async fn fail_delivery(&self, actor: Actor, cmd: FailDelivery) -> Result<Delivery> {
        let delivery_id = cmd.delivery_id;
        let reason = cmd.reason.clone();
        let existing = self
            .deliveries
            .get_delivery(delivery_id)
            .await
            .map_err(AssignmentError::Domain)?;

        let delivery = if existing.status() == DeliveryStatus::Failed {
            self.ensure_deliverer(actor, &existing)?;
            existing
        } else {
            self.deliveries
                .fail_delivery(actor, cmd)
                .await
                .map_err(AssignmentError::Domain)?
                .aggregate
        };

        if let Some(order_id) = delivery.order_id() {
            let order = self.orders.load(order_id).await?;
            // A compensated, never-bound delivery must not fail the order
            // someone else is fulfilling.
            if order.active_delivery() == Some(delivery_id) && !order.is_terminal() {
                let fail_reason = reason.clone();
                let order = self
                    .orders
                    .execute_loaded(order, order_id, actor, |order| {
                        order.mark_failed(actor, fail_reason)
                    })
                    .await?
                    .aggregate;
                if let Some(consumer_id) = order.consumer_id() {
                    self.send_notification(Notification::OrderFailed {
                        order_id,
                        consumer_id,
                        reason,
                    })
                    .await;
                }
            }
        }

        Ok(delivery)
    }

    /// Authorization check for the retry path, where no delivery command
    /// runs to enforce it.
    fn ensure_deliverer(&self, actor: Actor, delivery: &Delivery) -> Result<()> {
        if let Some(deliverer_id) = delivery.deliverer_id()
            && !actor.acts_as(deliverer_id)
        {
            return Err(AssignmentError::Domain(DomainError::Delivery(
                DeliveryError::NotAssignedDeliverer {
                    actor_id: actor.user_id,
                },
            )));
        }
        Ok(())
    }

    fn check_acceptable(&self, order: &Order) -> Result<()> {
        let order_id = order.id().unwrap_or_default();
        if let Some(delivery_id) = order.active_delivery() {
            return Err(AssignmentError::AlreadyAssigned {
                order_id,
                delivery_id,
            });
        }
        if order.status() != OrderStatus::Processing {
            return Err(AssignmentError::OrderNotOpen {
                order_id,
                status: order.status(),
            });
        }
        match order.delivery_info() {
            Some(info) if info.method == DeliveryMethod::HomeDelivery => Ok(()),
            _ => Err(AssignmentError::NotHomeDelivery(order_id)),
        }
    }

    /// Binds the delivery to the order, retrying the version check once.
    async fn bind(
        &self,
        actor: Actor,
        order: Order,
        order_id: AggregateId,
        delivery_id: AggregateId,
    ) -> Result<()> {
        let first = self
            .orders
            .execute_loaded(order, order_id, actor, |order| {
                order.bind_delivery(actor, delivery_id, actor.user_id)
            })
            .await;

        let err = match first {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        if !matches!(
            err,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        ) {
            return Err(self.classify_bind_error(order_id, err));
        }

        // Re-read once: the conflicting append may have been an unrelated
        // write (a payment record), in which case the bind is still ours to
        // take.
        let order = self.orders.load(order_id).await?;
        self.check_acceptable(&order)?;
        self.orders
            .execute_loaded(order, order_id, actor, |order| {
                order.bind_delivery(actor, delivery_id, actor.user_id)
            })
            .await
            .map_err(|err| self.classify_bind_error(order_id, err))?;
        Ok(())
    }

    fn classify_bind_error(&self, order_id: AggregateId, err: DomainError) -> AssignmentError {
        match err {
            DomainError::Order(OrderError::DeliveryAlreadyBound { delivery_id }) => {
                AssignmentError::AlreadyAssigned {
                    order_id,
                    delivery_id,
                }
            }
            other => AssignmentError::Domain(other),
        }
    }

    /// Fails a delivery that lost the accept race and was never bound.
    async fn compensate_orphan(&self, actor: Actor, delivery_id: AggregateId) {
        let cmd = FailDelivery::new(delivery_id, "lost assignment race");
        if let Err(err) = self.deliveries.fail_delivery(actor, cmd).await {
            tracing::warn!(%delivery_id, error = %err, "failed to compensate orphan delivery");
        }
    }

    async fn send_notification(&self, notification: Notification) {
        let order_id = notification.order_id();
        if let Err(err) = self.notifier.notify(notification).await {
            tracing::warn!(%order_id, error = %err, "notification dropped");
        }
    }
}
