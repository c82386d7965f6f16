//! Per-deliverer delivery statistics read model.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{DeliveryEvent, DeliveryStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::error::ReportingError;
use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// One completed delivery, kept for windowed counts and duration averages.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryCompletion {
    /// When the handoff happened.
    pub completed_at: DateTime<Utc>,
    /// Minutes between the delivery being opened and the handoff.
    pub minutes: f64,
}

/// Delivery counts for one deliverer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelivererStats {
    /// Counts of this deliverer's deliveries, grouped by current status.
    pub by_status: HashMap<DeliveryStatus, usize>,
    /// Total deliveries ever opened for this deliverer.
    pub total: usize,
    /// Every completed delivery, oldest first.
    pub completions: Vec<DeliveryCompletion>,
}

impl DelivererStats {
    /// Returns the count of deliveries currently in the given status.
    pub fn count(&self, status: DeliveryStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Returns the count of deliveries still in flight.
    pub fn active(&self) -> usize {
        self.total - self.count(DeliveryStatus::Delivered) - self.count(DeliveryStatus::Failed)
    }

    /// Counts deliveries completed inside the half-open window `[from, to)`.
    pub fn completed_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> usize {
        self.completions
            .iter()
            .filter(|c| c.completed_at >= from && c.completed_at < to)
            .count()
    }

    /// Mean minutes from opening a delivery to handing it off, over all
    /// completions. `None` until the first completion.
    pub fn average_minutes_to_deliver(&self) -> Option<f64> {
        if self.completions.is_empty() {
            return None;
        }
        let total: f64 = self.completions.iter().map(|c| c.minutes).sum();
        Some(total / self.completions.len() as f64)
    }
}

#[derive(Debug, Clone, Copy)]
struct DeliveryProgress {
    deliverer_id: UserId,
    status: DeliveryStatus,
    opened_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct DelivererStatsState {
    /// Current status of every delivery, for status-to-status moves.
    deliveries: HashMap<AggregateId, DeliveryProgress>,
    stats: HashMap<UserId, DelivererStats>,
}

impl DelivererStatsState {
    fn open(&mut self, delivery_id: AggregateId, deliverer_id: UserId, opened_at: DateTime<Utc>) {
        self.deliveries.insert(
            delivery_id,
            DeliveryProgress {
                deliverer_id,
                status: DeliveryStatus::Assigned,
                opened_at,
            },
        );
        let stats = self.stats.entry(deliverer_id).or_default();
        stats.total += 1;
        *stats.by_status.entry(DeliveryStatus::Assigned).or_insert(0) += 1;
    }

    fn move_to(&mut self, delivery_id: AggregateId, to: DeliveryStatus) {
        let Some(progress) = self.deliveries.get_mut(&delivery_id) else {
            return;
        };
        let deliverer_id = progress.deliverer_id;
        let previous = progress.status;
        progress.status = to;
        if let Some(stats) = self.stats.get_mut(&deliverer_id) {
            if let Some(count) = stats.by_status.get_mut(&previous) {
                *count = count.saturating_sub(1);
            }
            *stats.by_status.entry(to).or_insert(0) += 1;
        }
    }

    fn complete(&mut self, delivery_id: AggregateId, completed_at: DateTime<Utc>) {
        let Some(progress) = self.deliveries.get(&delivery_id).copied() else {
            return;
        };
        self.move_to(delivery_id, DeliveryStatus::Delivered);
        if let Some(stats) = self.stats.get_mut(&progress.deliverer_id) {
            let minutes = (completed_at - progress.opened_at).num_seconds() as f64 / 60.0;
            stats.completions.push(DeliveryCompletion {
                completed_at,
                minutes,
            });
        }
    }
}

/// Read model answering "how are this deliverer's deliveries doing".
#[derive(Clone)]
pub struct DelivererStatsView {
    state: Arc<RwLock<DelivererStatsState>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl DelivererStatsView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(DelivererStatsState::default())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Returns the stats for one deliverer.
    ///
    /// Errors with `UnknownDeliverer` if the views have never seen a
    /// delivery for this user.
    pub async fn stats_for(&self, deliverer_id: UserId) -> Result<DelivererStats> {
        self.state
            .read()
            .await
            .stats
            .get(&deliverer_id)
            .cloned()
            .ok_or(ReportingError::UnknownDeliverer(deliverer_id))
    }

    /// Counts all deliveries grouped by status, across deliverers.
    pub async fn counts_by_status(&self) -> HashMap<DeliveryStatus, usize> {
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for progress in state.deliveries.values() {
            *counts.entry(progress.status).or_insert(0) += 1;
        }
        counts
    }

    async fn advance(&self) {
        let mut pos = self.position.write().await;
        *pos = pos.advance();
    }
}

impl Default for DelivererStatsView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadModel for DelivererStatsView {
    fn name(&self) -> &'static str {
        "DelivererStatsView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.stats.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Projection for DelivererStatsView {
    fn name(&self) -> &'static str {
        "DelivererStatsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Delivery" {
            self.advance().await;
            return Ok(());
        }

        let delivery_event: DeliveryEvent = serde_json::from_value(event.payload.clone())?;
        let delivery_id = event.aggregate_id;
        let mut state = self.state.write().await;

        match delivery_event {
            DeliveryEvent::DeliveryOpened {
                deliverer_id,
                opened_at,
                ..
            } => {
                state.open(delivery_id, deliverer_id, opened_at);
            }
            DeliveryEvent::DeliveryStatusAdvanced { status, .. } => {
                state.move_to(delivery_id, status);
            }
            DeliveryEvent::DeliveryCompleted { completed_at, .. } => {
                state.complete(delivery_id, completed_at);
            }
            DeliveryEvent::DeliveryFailed { .. } => {
                state.move_to(delivery_id, DeliveryStatus::Failed);
            }
            DeliveryEvent::NoteAdded { .. } => {}
        }

        drop(state);
        self.advance().await;
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = DelivererStatsState::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}
