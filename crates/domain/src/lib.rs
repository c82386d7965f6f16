//! Domain layer for the marketplace fulfillment core.
//!
//! This crate provides the order-to-delivery workflow:
//! - Aggregate and DomainEvent traits for event-sourced entities
//! - A reusable lifecycle engine validating status transitions
//! - The Order aggregate (placement, status history, delivery binding)
//! - The Delivery aggregate (one deliverer's handoff of one order)
//! - Services wrapping the command handler, with catalog-priced placement

pub mod aggregate;
pub mod catalog;
pub mod command;
pub mod delivery;
pub mod error;
pub mod lifecycle;
pub mod order;

pub use aggregate::{Aggregate, DomainEvent, SnapshotCapable};
pub use catalog::{InMemoryProductCatalog, ProductCatalog, ProductListing};
pub use command::{CommandHandler, CommandResult};
pub use delivery::{
    AddNote, CompleteDelivery, Delivery, DeliveryError, DeliveryEvent, DeliveryNote,
    DeliveryService, DeliveryStatus, FailDelivery, Location, OpenDelivery, ProofOfDelivery,
    UpdateDeliveryStatus,
};
pub use error::{DomainError, ErrorKind};
pub use lifecycle::{Lifecycle, TransitionError};
pub use order::{
    CancelOrder, DeliveryInfo, DeliveryMethod, GeoPoint, Money, Order, OrderError, OrderEvent,
    OrderItem, OrderItemRequest, OrderService, OrderStatus, PaymentMethod, PaymentOutcome,
    PlaceOrder, ProductId, RecordPayment, StatusEntry,
};
