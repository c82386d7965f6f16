//! Delivery commands.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};

use super::state::DeliveryStatus;
use super::value_objects::{Location, ProofOfDelivery};

/// Command to open a delivery for an accepted order.
#[derive(Debug, Clone)]
pub struct OpenDelivery {
    /// The delivery ID to create.
    pub delivery_id: AggregateId,

    /// The order being fulfilled.
    pub order_id: AggregateId,

    /// The deliverer taking the order.
    pub deliverer_id: UserId,

    /// Where the goods are collected.
    pub pickup_location: Location,

    /// Where the goods are handed over.
    pub delivery_location: Location,

    /// When the handoff is expected, if known.
    pub estimated_time: Option<DateTime<Utc>>,
}

impl OpenDelivery {
    /// Creates an OpenDelivery command with a generated delivery ID.
    pub fn new(
        order_id: AggregateId,
        deliverer_id: UserId,
        pickup_location: Location,
        delivery_location: Location,
    ) -> Self {
        Self {
            delivery_id: AggregateId::new(),
            order_id,
            deliverer_id,
            pickup_location,
            delivery_location,
            estimated_time: None,
        }
    }

    pub fn with_estimated_time(mut self, at: DateTime<Utc>) -> Self {
        self.estimated_time = Some(at);
        self
    }
}

/// Command to move a delivery to a new status.
#[derive(Debug, Clone)]
pub struct UpdateDeliveryStatus {
    /// The delivery to update.
    pub delivery_id: AggregateId,

    /// The status to move to.
    pub new_status: DeliveryStatus,

    /// Optional note to attach alongside the change.
    pub note: Option<String>,
}

impl UpdateDeliveryStatus {
    pub fn new(delivery_id: AggregateId, new_status: DeliveryStatus) -> Self {
        Self {
            delivery_id,
            new_status,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Command to complete a delivery with optional proof.
#[derive(Debug, Clone)]
pub struct CompleteDelivery {
    /// The delivery being completed.
    pub delivery_id: AggregateId,

    /// Evidence of the handoff, if captured.
    pub proof: Option<ProofOfDelivery>,
}

impl CompleteDelivery {
    pub fn new(delivery_id: AggregateId) -> Self {
        Self {
            delivery_id,
            proof: None,
        }
    }

    pub fn with_proof(mut self, proof: ProofOfDelivery) -> Self {
        self.proof = Some(proof);
        self
    }
}

/// Command to fail a delivery.
#[derive(Debug, Clone)]
pub struct FailDelivery {
    /// The delivery being failed.
    pub delivery_id: AggregateId,

    /// Why the delivery could not be completed.
    pub reason: String,
}

impl FailDelivery {
    pub fn new(delivery_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            delivery_id,
            reason: reason.into(),
        }
    }
}

/// Command to attach a free-text note to a delivery.
#[derive(Debug, Clone)]
pub struct AddNote {
    /// The delivery the note belongs to.
    pub delivery_id: AggregateId,

    /// The note text.
    pub text: String,
}

impl AddNote {
    pub fn new(delivery_id: AggregateId, text: impl Into<String>) -> Self {
        Self {
            delivery_id,
            text: text.into(),
        }
    }
}
