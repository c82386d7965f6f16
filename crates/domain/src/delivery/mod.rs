//! Delivery domain model.
//!
//! A delivery is one deliverer's handoff of one order. It is opened by the
//! assignment coordinator at acceptance time and from then on mutated only
//! by its assigned deliverer (or an admin).

pub mod aggregate;
pub mod commands;
pub mod events;
pub mod service;
pub mod state;
pub mod value_objects;

pub use aggregate::Delivery;
pub use commands::{AddNote, CompleteDelivery, FailDelivery, OpenDelivery, UpdateDeliveryStatus};
pub use events::DeliveryEvent;
pub use service::DeliveryService;
pub use state::{DELIVERY_LIFECYCLE, DeliveryStatus};
pub use value_objects::{DeliveryNote, Location, ProofOfDelivery};

use common::UserId;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::lifecycle::TransitionError;

/// Errors from delivery commands.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The delivery stream already holds an opening event.
    #[error("delivery has already been opened")]
    AlreadyOpened,

    /// The command targets a delivery that was never opened.
    #[error("delivery has not been opened")]
    NotOpened,

    /// Only the assigned deliverer (or an admin) may mutate a delivery.
    #[error("user {actor_id} is not the assigned deliverer")]
    NotAssignedDeliverer { actor_id: UserId },

    /// The requested status change is not in the lifecycle graph.
    #[error(transparent)]
    Transition(#[from] TransitionError<DeliveryStatus>),
}

impl DeliveryError {
    /// Classifies the error for callers that map to transport responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::AlreadyOpened => ErrorKind::Conflict,
            DeliveryError::NotOpened => ErrorKind::NotFound,
            DeliveryError::NotAssignedDeliverer { .. } => ErrorKind::Forbidden,
            DeliveryError::Transition(TransitionError::Terminal { .. }) => ErrorKind::TerminalState,
            DeliveryError::Transition(TransitionError::Illegal { .. }) => {
                ErrorKind::InvalidTransition
            }
        }
    }
}
