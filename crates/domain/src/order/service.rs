//! Order service providing a high-level API for order operations.

use std::sync::Arc;

use common::{Actor, AggregateId};
use event_store::EventStore;

use crate::catalog::ProductCatalog;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    CancelOrder, Order, OrderError, OrderItem, OrderItemRequest, PlaceOrder, RecordPayment,
};

/// Service for managing orders.
///
/// Wraps the command handler and prices incoming order lines against the
/// catalog before they reach the aggregate.
pub struct OrderService<S: EventStore> {
    handler: CommandHandler<S, Order>,
    catalog: Arc<dyn ProductCatalog>,
}

impl<S: EventStore> OrderService<S> {
    /// Creates a new order service with the given event store and catalog.
    pub fn new(store: S, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            catalog,
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Places a new order, pricing each line against the catalog.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn place_order(
        &self,
        actor: Actor,
        cmd: PlaceOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let items = self.price_items(&cmd.items).await?;
        let order_id = cmd.order_id;
        let consumer_id = cmd.consumer_id;
        let delivery_info = cmd.delivery_info;
        let payment_method = cmd.payment_method;

        let result = self
            .handler
            .execute_with_snapshot(order_id, actor, |order| {
                order.place(
                    order_id,
                    actor,
                    consumer_id,
                    items,
                    delivery_info,
                    payment_method,
                )
            })
            .await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(%order_id, total_cents = result.aggregate.total().cents(), "order placed");
        Ok(result)
    }

    /// Cancels an order before it ships.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn cancel_order(
        &self,
        actor: Actor,
        cmd: CancelOrder,
    ) -> Result<CommandResult<Order>, DomainError> {
        let reason = cmd.reason;
        let result = self
            .handler
            .execute_with_snapshot(cmd.order_id, actor, |order| order.cancel(actor, reason))
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(result)
    }

    /// Records a payment attempt against an order.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn record_payment(
        &self,
        actor: Actor,
        cmd: RecordPayment,
    ) -> Result<CommandResult<Order>, DomainError> {
        self.handler
            .execute_with_snapshot(cmd.order_id, actor, |order| {
                order.record_payment(actor, cmd.amount, cmd.method, cmd.outcome)
            })
            .await
    }

    /// Loads an order, or errors if it doesn't exist.
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Order, DomainError> {
        self.handler
            .load_existing(order_id)
            .await?
            .ok_or(DomainError::NotFound {
                kind: "Order",
                id: order_id.to_string(),
            })
    }

    async fn price_items(
        &self,
        requests: &[OrderItemRequest],
    ) -> Result<Vec<OrderItem>, DomainError> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let listing = self.catalog.resolve(&request.product_id).await.ok_or_else(|| {
                OrderError::UnknownProduct {
                    product_id: request.product_id.to_string(),
                }
            })?;
            items.push(OrderItem {
                product_id: request.product_id.clone(),
                product_name: listing.name,
                quantity: request.quantity,
                unit_price: listing.unit_price,
            });
        }
        Ok(items)
    }
}
