//! Domain error types and the shared error taxonomy.

use event_store::EventStoreError;
use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::order::OrderError;

/// The caller-facing classification of a failure.
///
/// Every error in the fulfillment core maps to exactly one kind, which tells
/// the caller what to do: fix the request (`Validation`), pick another order
/// (`Conflict`), retry with backoff (`Transient`), or give up
/// (`Forbidden`, `InvalidTransition`, `TerminalState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; never retried automatically.
    Validation,
    /// A referenced order, delivery, or user does not exist.
    NotFound,
    /// A uniqueness invariant was about to be violated (lost a race).
    Conflict,
    /// The actor is not authorized for the requested mutation.
    Forbidden,
    /// The requested status change is not a declared lifecycle edge.
    InvalidTransition,
    /// The aggregate is in a terminal state; no further writes permitted.
    TerminalState,
    /// Persistence timeout/unavailability; safe to retry idempotently.
    Transient,
    /// Infrastructure fault (serialization, malformed stored data).
    Internal,
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error from the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error from the delivery aggregate.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// A referenced aggregate does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Classifies this error into the shared taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Order(e) => e.kind(),
            DomainError::Delivery(e) => e.kind(),
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::EventStore(e) => match e {
                EventStoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
                EventStoreError::AggregateNotFound(_) => ErrorKind::NotFound,
                EventStoreError::Unavailable(_) => ErrorKind::Transient,
                EventStoreError::InvalidBatch(_) | EventStoreError::Serialization(_) => {
                    ErrorKind::Internal
                }
            },
            DomainError::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
