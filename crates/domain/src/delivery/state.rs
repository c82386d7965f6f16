//! Delivery status machine.

use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;

/// The status of a delivery in its lifecycle.
///
/// Status transitions:
/// ```text
/// Assigned ──► PickedUp ──► InTransit ──► Delivered
///     │            │            │
///     └────────────┴────────────┴──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    /// A deliverer accepted the order; goods not yet collected.
    #[default]
    Assigned,

    /// Goods collected from the pickup location.
    PickedUp,

    /// Goods on the way to the consumer.
    InTransit,

    /// Goods handed over (terminal state).
    Delivered,

    /// The delivery could not be completed (terminal state).
    Failed,
}

/// The one valid transition graph for deliveries.
///
/// Failed is reachable from every non-terminal status; the happy path is
/// strictly forward with no skipping.
pub static DELIVERY_LIFECYCLE: Lifecycle<DeliveryStatus> = Lifecycle::new(
    &[
        (DeliveryStatus::Assigned, DeliveryStatus::PickedUp),
        (DeliveryStatus::PickedUp, DeliveryStatus::InTransit),
        (DeliveryStatus::InTransit, DeliveryStatus::Delivered),
        (DeliveryStatus::Assigned, DeliveryStatus::Failed),
        (DeliveryStatus::PickedUp, DeliveryStatus::Failed),
        (DeliveryStatus::InTransit, DeliveryStatus::Failed),
    ],
    &[DeliveryStatus::Delivered, DeliveryStatus::Failed],
);

impl DeliveryStatus {
    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        DELIVERY_LIFECYCLE.is_terminal(*self)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Assigned => "Assigned",
            DeliveryStatus::PickedUp => "PickedUp",
            DeliveryStatus::InTransit => "InTransit",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}
