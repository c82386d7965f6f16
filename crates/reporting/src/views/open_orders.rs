//! Open orders read model — the deliverer-facing dashboard feed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{DeliveryMethod, Money, OrderEvent};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// A home-delivery order still waiting for a deliverer.
#[derive(Debug, Clone)]
pub struct OpenOrderSummary {
    pub order_id: AggregateId,
    pub consumer_id: UserId,
    pub total: Money,
    pub address: String,
    pub placed_at: DateTime<Utc>,
}

/// Dashboard view of home-delivery orders with no delivery bound yet.
///
/// This is an eventually consistent convenience feed; the coordinator's own
/// listing replays committed streams and stays authoritative for accepts.
#[derive(Clone)]
pub struct OpenOrdersView {
    orders: Arc<RwLock<HashMap<AggregateId, OpenOrderSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OpenOrdersView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Lists open orders, oldest first so the longest-waiting surface first.
    pub async fn open_orders(&self) -> Vec<OpenOrderSummary> {
        let mut open: Vec<OpenOrderSummary> =
            self.orders.read().await.values().cloned().collect();
        open.sort_by_key(|o| o.placed_at);
        open
    }

    async fn advance(&self) {
        let mut pos = self.position.write().await;
        *pos = pos.advance();
    }
}

impl Default for OpenOrdersView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadModel for OpenOrdersView {
    fn name(&self) -> &'static str {
        "OpenOrdersView"
    }

    fn count(&self) -> usize {
        self.orders.try_read().map(|o| o.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Projection for OpenOrdersView {
    fn name(&self) -> &'static str {
        "OpenOrdersView"
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
                delivery_info,
                placed_at,
                ..
            } => {
                if delivery_info.method == DeliveryMethod::HomeDelivery {
                    orders.insert(
                        order_id,
                        OpenOrderSummary {
                            order_id,
                            consumer_id,
                            total,
                            address: delivery_info.address,
                            placed_at,
                        },
                    );
                }
            }
            // Any exit from the assignable window removes the order.
            OrderEvent::OrderShipped { .. }
            | OrderEvent::OrderCancelled { .. }
            | OrderEvent::OrderFailed { .. }
            | OrderEvent::OrderDelivered { .. } => {
                orders.remove(&order_id);
            }
            OrderEvent::OrderProcessing { .. } | OrderEvent::PaymentRecorded { .. } => {}
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
