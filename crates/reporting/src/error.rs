//! Reporting error types.

use common::UserId;
use thiserror::Error;

/// Errors that can occur while building or querying read models.
#[derive(Debug, Error)]
pub enum ReportingError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// Failed to deserialize an event payload.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A stats query referenced a deliverer the views have never seen.
    #[error("Unknown deliverer: {0}")]
    UnknownDeliverer(UserId),
}

/// Result type for reporting operations.
pub type Result<T> = std::result::Result<T, ReportingError>;
