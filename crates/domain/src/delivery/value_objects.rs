//! Value objects for the delivery domain.

use chrono::{DateTime, Utc};
use common::Actor;
use serde::{Deserialize, Serialize};

use crate::order::GeoPoint;

/// A physical place a delivery touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Option<GeoPoint>,
}

impl Location {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, point: GeoPoint) -> Self {
        self.coordinates = Some(point);
        self
    }
}

/// Reference to evidence that the handoff happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofOfDelivery {
    /// Storage reference for the proof photo.
    pub photo_ref: String,
}

impl ProofOfDelivery {
    pub fn photo(photo_ref: impl Into<String>) -> Self {
        Self {
            photo_ref: photo_ref.into(),
        }
    }
}

/// A free-text note attached to a delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub text: String,
    pub added_by: Actor,
    pub added_at: DateTime<Utc>,
}

impl DeliveryNote {
    pub fn new(text: impl Into<String>, added_by: Actor) -> Self {
        Self {
            text: text.into(),
            added_by,
            added_at: Utc::now(),
        }
    }
}
