//! Order domain model.
//!
//! The order is the consumer-facing aggregate: placement, cancellation,
//! payment, and the binding of exactly one delivery.

pub mod aggregate;
pub mod commands;
pub mod events;
pub mod service;
pub mod state;
pub mod value_objects;

pub use aggregate::{Order, PaymentRecord};
pub use commands::{CancelOrder, PlaceOrder, RecordPayment};
pub use events::OrderEvent;
pub use service::OrderService;
pub use state::{ORDER_LIFECYCLE, OrderStatus};
pub use value_objects::{
    DeliveryInfo, DeliveryMethod, GeoPoint, Money, OrderItem, OrderItemRequest, PaymentMethod,
    PaymentOutcome, ProductId, StatusEntry,
};

use common::AggregateId;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::lifecycle::TransitionError;

/// Errors from order commands.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order stream already holds a placement event.
    #[error("order has already been placed")]
    AlreadyPlaced,

    /// The command targets an order that was never placed.
    #[error("order has not been placed")]
    NotPlaced,

    /// The actor may not perform this action on this order.
    #[error("not authorized to {action}")]
    NotAuthorized { action: &'static str },

    /// An order must contain at least one line.
    #[error("order contains no items")]
    NoItems,

    /// Order lines must have a positive quantity.
    #[error("invalid quantity for product {product_id}")]
    InvalidQuantity { product_id: String },

    /// Home delivery needs somewhere to deliver to.
    #[error("delivery address is missing")]
    MissingAddress,

    /// Payments must be for a positive amount.
    #[error("invalid payment amount: {cents} cents")]
    InvalidAmount { cents: i64 },

    /// A product line could not be resolved against the catalog.
    #[error("unknown product: {product_id}")]
    UnknownProduct { product_id: String },

    /// The order already has a delivery bound to it.
    #[error("order already has delivery {delivery_id} bound")]
    DeliveryAlreadyBound { delivery_id: AggregateId },

    /// The requested status change is not in the lifecycle graph.
    #[error(transparent)]
    Transition(#[from] TransitionError<OrderStatus>),
}

impl OrderError {
    /// Classifies the error for callers that map to transport responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::AlreadyPlaced | OrderError::DeliveryAlreadyBound { .. } => {
                ErrorKind::Conflict
            }
            OrderError::NotPlaced => ErrorKind::NotFound,
            OrderError::NotAuthorized { .. } => ErrorKind::Forbidden,
            OrderError::NoItems
            | OrderError::InvalidQuantity { .. }
            | OrderError::MissingAddress
            | OrderError::InvalidAmount { .. } => ErrorKind::Validation,
            OrderError::UnknownProduct { .. } => ErrorKind::NotFound,
            OrderError::Transition(TransitionError::Terminal { .. }) => ErrorKind::TerminalState,
            OrderError::Transition(TransitionError::Illegal { .. }) => ErrorKind::InvalidTransition,
        }
    }
}
