//! Reporting facade for the marketplace fulfillment core.
//!
//! This crate provides the query side of the workflow:
//! - [`Projection`] trait for folding events into read models
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for feeding events from the store to projections
//! - Three read model views: order status counts, per-deliverer delivery
//!   stats, and the open-orders dashboard feed

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

pub use error::{ReportingError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{
    DelivererStats, DelivererStatsView, DeliveryCompletion, OpenOrderSummary, OpenOrdersView,
    OrderStatusView,
    OrderSummary,
};
