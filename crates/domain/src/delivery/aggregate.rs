//! Delivery aggregate implementation.

use chrono::{DateTime, Utc};
use common::{Actor, AggregateId, UserId};
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, SnapshotCapable};

use super::state::{DELIVERY_LIFECYCLE, DeliveryStatus};
use super::value_objects::{DeliveryNote, Location, ProofOfDelivery};
use super::{DeliveryError, DeliveryEvent};

/// Delivery aggregate root.
///
/// One physical handoff of one order by one deliverer. The deliverer is
/// fixed at opening; a failed delivery is never reassigned in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delivery {
    /// Unique delivery identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// The order this delivery fulfills.
    order_id: Option<AggregateId>,

    /// The deliverer executing the handoff. Immutable once set.
    deliverer_id: Option<UserId>,

    /// Where the goods are collected.
    pickup_location: Option<Location>,

    /// Where the goods are handed over.
    delivery_location: Option<Location>,

    /// When the handoff is expected to happen.
    estimated_time: Option<DateTime<Utc>>,

    /// When the handoff actually happened.
    actual_delivery_time: Option<DateTime<Utc>>,

    /// Current status of the delivery.
    status: DeliveryStatus,

    /// Free-text notes, oldest first.
    notes: Vec<DeliveryNote>,

    /// Evidence of the handoff, if captured.
    proof: Option<ProofOfDelivery>,
}

impl Aggregate for Delivery {
    type Event = DeliveryEvent;
    type Error = DeliveryError;

    fn aggregate_type() -> &'static str {
        "Delivery"
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
            DeliveryEvent::DeliveryOpened {
                delivery_id,
                order_id,
                deliverer_id,
                pickup_location,
                delivery_location,
                estimated_time,
                ..
            } => {
                self.id = Some(delivery_id);
                self.order_id = Some(order_id);
                self.deliverer_id = Some(deliverer_id);
                self.pickup_location = Some(pickup_location);
                self.delivery_location = Some(delivery_location);
                self.estimated_time = estimated_time;
                self.status = DeliveryStatus::Assigned;
            }
            DeliveryEvent::DeliveryStatusAdvanced { status, .. } => {
                self.status = status;
            }
            DeliveryEvent::DeliveryCompleted {
                proof,
                completed_at,
                ..
            } => {
                self.status = DeliveryStatus::Delivered;
                self.actual_delivery_time = Some(completed_at);
                self.proof = proof;
            }
            DeliveryEvent::DeliveryFailed { .. } => {
                self.status = DeliveryStatus::Failed;
            }
            DeliveryEvent::NoteAdded { note } => {
                self.notes.push(note);
            }
        }
    }
}

impl SnapshotCapable for Delivery {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Delivery {
    /// Returns the order this delivery fulfills.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the deliverer executing the handoff.
    pub fn deliverer_id(&self) -> Option<UserId> {
        self.deliverer_id
    }

    /// Returns the current status.
    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Returns the pickup location.
    pub fn pickup_location(&self) -> Option<&Location> {
        self.pickup_location.as_ref()
    }

    /// Returns the handover location.
    pub fn delivery_location(&self) -> Option<&Location> {
        self.delivery_location.as_ref()
    }

    /// Returns when the handoff is expected.
    pub fn estimated_time(&self) -> Option<DateTime<Utc>> {
        self.estimated_time
    }

    /// Returns when the handoff actually happened.
    pub fn actual_delivery_time(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery_time
    }

    /// Returns the notes attached so far, oldest first.
    pub fn notes(&self) -> &[DeliveryNote] {
        &self.notes
    }

    /// Returns the proof of delivery, if captured.
    pub fn proof(&self) -> Option<&ProofOfDelivery> {
        self.proof.as_ref()
    }

    /// Returns true if the delivery is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn require_opened(&self) -> Result<UserId, DeliveryError> {
        if self.id.is_none() {
            return Err(DeliveryError::NotOpened);
        }
        self.deliverer_id.ok_or(DeliveryError::NotOpened)
    }

    fn authorize(&self, actor: Actor) -> Result<(), DeliveryError> {
        let deliverer_id = self.require_opened()?;
        if !actor.acts_as(deliverer_id) {
            return Err(DeliveryError::NotAssignedDeliverer {
                actor_id: actor.user_id,
            });
        }
        Ok(())
    }

    fn check_transition(&self, to: DeliveryStatus) -> Result<(), DeliveryError> {
        DELIVERY_LIFECYCLE
            .check(self.status, to)
            .map_err(DeliveryError::from)
    }
}

// Command methods (return events)
impl Delivery {
    /// Opens a delivery for an accepted order.
    ///
    /// The deliverer recorded here can never change; reassignment means a
    /// new Delivery.
    pub fn open(
        &self,
        delivery_id: AggregateId,
        actor: Actor,
        order_id: AggregateId,
        deliverer_id: UserId,
        pickup_location: Location,
        delivery_location: Location,
        estimated_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        if self.id.is_some() {
            return Err(DeliveryError::AlreadyOpened);
        }
        if !actor.acts_as(deliverer_id) {
            return Err(DeliveryError::NotAssignedDeliverer {
                actor_id: actor.user_id,
            });
        }

        Ok(vec![DeliveryEvent::DeliveryOpened {
            delivery_id,
            order_id,
            deliverer_id,
            pickup_location,
            delivery_location,
            estimated_time,
            opened_by: actor,
            opened_at: Utc::now(),
        }])
    }

    /// Moves the delivery to the requested status.
    ///
    /// Delivered and Failed targets route through `complete` and `fail` so
    /// their extra effects (actual time, proof, reason) are never skipped.
    pub fn update_status(
        &self,
        actor: Actor,
        new_status: DeliveryStatus,
        note: Option<String>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        match new_status {
            DeliveryStatus::Delivered => self.complete(actor, None),
            DeliveryStatus::Failed => {
                self.fail(actor, note.unwrap_or_else(|| "marked failed".to_string()))
            }
            _ => {
                self.authorize(actor)?;
                self.check_transition(new_status)?;

                let mut events = vec![DeliveryEvent::DeliveryStatusAdvanced {
                    status: new_status,
                    updated_by: actor,
                    updated_at: Utc::now(),
                }];
                if let Some(text) = note {
                    events.push(DeliveryEvent::NoteAdded {
                        note: DeliveryNote::new(text, actor),
                    });
                }
                Ok(events)
            }
        }
    }

    /// Completes the delivery, recording the handoff time and optional proof.
    pub fn complete(
        &self,
        actor: Actor,
        proof: Option<ProofOfDelivery>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        self.authorize(actor)?;
        self.check_transition(DeliveryStatus::Delivered)?;

        Ok(vec![DeliveryEvent::DeliveryCompleted {
            proof,
            completed_by: actor,
            completed_at: Utc::now(),
        }])
    }

    /// Fails the delivery. Reachable from any non-terminal status.
    pub fn fail(
        &self,
        actor: Actor,
        reason: impl Into<String>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        self.authorize(actor)?;
        self.check_transition(DeliveryStatus::Failed)?;

        Ok(vec![DeliveryEvent::DeliveryFailed {
            reason: reason.into(),
            failed_by: actor,
            failed_at: Utc::now(),
        }])
    }

    /// Attaches a free-text note.
    pub fn add_note(
        &self,
        actor: Actor,
        text: impl Into<String>,
    ) -> Result<Vec<DeliveryEvent>, DeliveryError> {
        self.authorize(actor)?;

        Ok(vec![DeliveryEvent::NoteAdded {
            note: DeliveryNote::new(text, actor),
        }])
    }
}
