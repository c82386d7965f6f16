//! Order status read model — counts and time-windowed listings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{Money, OrderEvent, OrderStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of one order in the status view.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub consumer_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read model over all orders, supporting counts by status and
/// date-range/status filtered listings.
#[derive(Clone)]
pub struct OrderStatusView {
    orders: Arc<RwLock<HashMap<AggregateId, OrderSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OrderStatusView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets the summary of a specific order.
    pub async fn get_order(&self, order_id: AggregateId) -> Option<OrderSummary> {
        self.orders.read().await.get(&order_id).cloned()
    }

    /// Counts orders grouped by status.
    pub async fn counts_by_status(&self) -> HashMap<OrderStatus, usize> {
        let mut counts = HashMap::new();
        for summary in self.orders.read().await.values() {
            *counts.entry(summary.status).or_insert(0) += 1;
        }
        counts
    }

    /// Lists orders placed within the given window, newest first,
    /// optionally restricted to one status.
    pub async fn orders_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Vec<OrderSummary> {
        let mut matching: Vec<OrderSummary> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.placed_at >= from && o.placed_at <= to)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        matching
    }

    /// Lists orders for one consumer, newest first.
    pub async fn orders_for_consumer(&self, consumer_id: UserId) -> Vec<OrderSummary> {
        let mut matching: Vec<OrderSummary> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.consumer_id == consumer_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        matching
    }

    async fn advance(&self) {
        let mut pos = self.position.write().await;
        *pos = pos.advance();
    }
}

impl Default for OrderStatusView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadModel for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Projection for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            self.advance().await;
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;
        let mut orders = self.orders.write().await;

        match order_event {
            OrderEvent::OrderPlaced {
                consumer_id,
                total,
                placed_at,
                ..
            } => {
                orders.insert(
                    order_id,
                    OrderSummary {
                        order_id,
                        consumer_id,
                        status: OrderStatus::Pending,
                        total,
                        placed_at,
                        updated_at: placed_at,
                    },
                );
            }
            OrderEvent::OrderProcessing { updated_at, .. } => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Processing;
                    order.updated_at = updated_at;
                }
            }
            OrderEvent::OrderShipped { updated_at, .. } => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Shipped;
                    order.updated_at = updated_at;
                }
            }
            OrderEvent::OrderDelivered { updated_at, .. } => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Delivered;
                    order.updated_at = updated_at;
                }
            }
            OrderEvent::OrderCancelled { cancelled_at, .. } => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Cancelled;
                    order.updated_at = cancelled_at;
                }
            }
            OrderEvent::OrderFailed { updated_at, .. } => {
                if let Some(order) = orders.get_mut(&order_id) {
                    order.status = OrderStatus::Failed;
                    order.updated_at = updated_at;
                }
            }
            OrderEvent::PaymentRecorded { .. } => {}
        }

        drop(orders);
        self.advance().await;
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.orders.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
