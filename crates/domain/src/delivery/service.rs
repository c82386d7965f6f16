//! Delivery service providing a high-level API for delivery operations.

use common::{Actor, AggregateId};
use event_store::EventStore;

use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    AddNote, CompleteDelivery, Delivery, FailDelivery, OpenDelivery, UpdateDeliveryStatus,
};

/// Service for managing deliveries.
pub struct DeliveryService<S: EventStore> {
    handler: CommandHandler<S, Delivery>,
}

impl<S: EventStore> DeliveryService<S> {
    /// Creates a new delivery service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Delivery> {
        &self.handler
    }

    /// Opens a delivery for an accepted order.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id, order_id = %cmd.order_id))]
    pub async fn open_delivery(
        &self,
        actor: Actor,
        cmd: OpenDelivery,
    ) -> Result<CommandResult<Delivery>, DomainError> {
        let delivery_id = cmd.delivery_id;
        let result = self
            .handler
            .execute_with_snapshot(delivery_id, actor, |delivery| {
                delivery.open(
                    delivery_id,
                    actor,
                    cmd.order_id,
                    cmd.deliverer_id,
                    cmd.pickup_location,
                    cmd.delivery_location,
                    cmd.estimated_time,
                )
            })
            .await?;

        metrics::counter!("deliveries_opened_total").increment(1);
        Ok(result)
    }

    /// Moves a delivery to a new status.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id, status = %cmd.new_status))]
    pub async fn update_status(
        &self,
        actor: Actor,
        cmd: UpdateDeliveryStatus,
    ) -> Result<CommandResult<Delivery>, DomainError> {
        self.handler
            .execute_with_snapshot(cmd.delivery_id, actor, |delivery| {
                delivery.update_status(actor, cmd.new_status, cmd.note)
            })
            .await
    }

    /// Completes a delivery, recording the handoff time and optional proof.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id))]
    pub async fn complete_delivery(
        &self,
        actor: Actor,
        cmd: CompleteDelivery,
    ) -> Result<CommandResult<Delivery>, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(cmd.delivery_id, actor, |delivery| {
                delivery.complete(actor, cmd.proof)
            })
            .await?;

        metrics::counter!("deliveries_completed_total").increment(1);
        Ok(result)
    }

    /// Fails a delivery.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id))]
    pub async fn fail_delivery(
        &self,
        actor: Actor,
        cmd: FailDelivery,
    ) -> Result<CommandResult<Delivery>, DomainError> {
        let result = self
            .handler
            .execute_with_snapshot(cmd.delivery_id, actor, |delivery| {
                delivery.fail(actor, cmd.reason)
            })
            .await?;

        metrics::counter!("deliveries_failed_total").increment(1);
        Ok(result)
    }

    /// Attaches a free-text note to a delivery.
    #[tracing::instrument(skip(self, cmd), fields(delivery_id = %cmd.delivery_id))]
    pub async fn add_note(
        &self,
        actor: Actor,
        cmd: AddNote,
    ) -> Result<CommandResult<Delivery>, DomainError> {
        self.handler
            .execute_with_snapshot(cmd.delivery_id, actor, |delivery| {
                delivery.add_note(actor, cmd.text)
            })
            .await
    }

    /// Loads a delivery, or errors if it doesn't exist.
    pub async fn get_delivery(&self, delivery_id: AggregateId) -> Result<Delivery, DomainError> {
        self.handler
            .load_existing(delivery_id)
            .await?
            .ok_or(DomainError::NotFound {
                kind: "Delivery",
                id: delivery_id.to_string(),
            })
    }
}
