//! Assignment error types.

use common::AggregateId;
use domain::{DomainError, ErrorKind, OrderStatus};
use event_store::EventStoreError;
use thiserror::Error;

/// Errors that can occur while coordinating assignments.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Order not found.
    #[error("order not found: {0}")]
    OrderNotFound(AggregateId),

    /// Only home-delivery orders enter the assignment pool.
    #[error("order {0} does not request home delivery")]
    NotHomeDelivery(AggregateId),

    /// Another deliverer already holds this order.
    #[error("order {order_id} already has delivery {delivery_id} bound")]
    AlreadyAssigned {
        order_id: AggregateId,
        delivery_id: AggregateId,
    },

    /// The order has moved out of the assignable statuses.
    #[error("order {order_id} is not open for assignment (status {status})")]
    OrderNotOpen {
        order_id: AggregateId,
        status: OrderStatus,
    },

    /// Domain error.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Event store error.
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssignmentError {
    /// Classifies the error for callers that map to transport responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssignmentError::OrderNotFound(_) => ErrorKind::NotFound,
            AssignmentError::NotHomeDelivery(_) => ErrorKind::Validation,
            AssignmentError::AlreadyAssigned { .. } | AssignmentError::OrderNotOpen { .. } => {
                ErrorKind::Conflict
            }
            AssignmentError::Domain(e) => e.kind(),
            AssignmentError::EventStore(e) => match e {
                EventStoreError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
                EventStoreError::AggregateNotFound(_) => ErrorKind::NotFound,
                EventStoreError::Unavailable(_) => ErrorKind::Transient,
                EventStoreError::InvalidBatch(_) | EventStoreError::Serialization(_) => {
                    ErrorKind::Internal
                }
            },
            AssignmentError::Serialization(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for assignment results.
pub type Result<T> = std::result::Result<T, AssignmentError>;
