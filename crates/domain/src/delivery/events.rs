//! Events emitted by the delivery aggregate.

use chrono::{DateTime, Utc};
use common::{Actor, AggregateId, UserId};
use serde::{Deserialize, Serialize};

use super::value_objects::{DeliveryNote, Location, ProofOfDelivery};
use super::state::DeliveryStatus;
use crate::aggregate::DomainEvent;

/// All events that can happen to a delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeliveryEvent {
    /// A deliverer accepted an order and the delivery was opened.
    DeliveryOpened {
        delivery_id: AggregateId,
        order_id: AggregateId,
        deliverer_id: UserId,
        pickup_location: Location,
        delivery_location: Location,
        estimated_time: Option<DateTime<Utc>>,
        opened_by: Actor,
        opened_at: DateTime<Utc>,
    },

    /// The delivery advanced one step along its lifecycle.
    DeliveryStatusAdvanced {
        status: DeliveryStatus,
        updated_by: Actor,
        updated_at: DateTime<Utc>,
    },

    /// The goods were handed over; terminal.
    DeliveryCompleted {
        proof: Option<ProofOfDelivery>,
        completed_by: Actor,
        completed_at: DateTime<Utc>,
    },

    /// The delivery could not be completed; terminal.
    DeliveryFailed {
        reason: String,
        failed_by: Actor,
        failed_at: DateTime<Utc>,
    },

    /// A free-text note was attached.
    NoteAdded { note: DeliveryNote },
}

impl DomainEvent for DeliveryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryEvent::DeliveryOpened { .. } => "DeliveryOpened",
            DeliveryEvent::DeliveryStatusAdvanced { .. } => "DeliveryStatusAdvanced",
            DeliveryEvent::DeliveryCompleted { .. } => "DeliveryCompleted",
            DeliveryEvent::DeliveryFailed { .. } => "DeliveryFailed",
            DeliveryEvent::NoteAdded { .. } => "NoteAdded",
        }
    }
}
