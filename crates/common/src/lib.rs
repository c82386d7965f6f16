//! Shared identifier and actor types used across the fulfillment crates.

pub mod types;

pub use types::{Actor, AggregateId, Role, UserId};
