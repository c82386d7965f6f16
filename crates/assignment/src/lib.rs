//! Assignment coordination for the marketplace fulfillment core.
//!
//! This crate owns the one genuinely contended operation in the system:
//! matching open home-delivery orders to deliverers with first-accept-wins
//! semantics. It also drives the terminal delivery transitions back into
//! the owning order and pushes fire-and-forget notifications.

pub mod coordinator;
pub mod error;
pub mod notification;

pub use coordinator::{AcceptOrder, AssignmentCoordinator};
pub use error::{AssignmentError, Result};
pub use notification::{InMemoryNotificationService, Notification, NotificationService};
