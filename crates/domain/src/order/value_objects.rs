//! Value objects for the order domain.

use chrono::{DateTime, Utc};
use common::Actor;
use serde::{Deserialize, Serialize};

use super::state::OrderStatus;

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Adds another money amount.
    pub fn add(&self, other: Money) -> Money {
        Money {
            cents: self.cents + other.cents,
        }
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents.abs() % 100)
    }
}

/// A requested order line, as submitted by the consumer.
///
/// Prices are not trusted from the caller; placement resolves each line
/// against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderItemRequest {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

impl From<&str> for OrderItemRequest {
    fn from(s: &str) -> Self {
        Self::new(ProductId::new(s), 1)
    }
}

/// A priced order line, frozen at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Returns the total price for this line (unit price * quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// How the goods move from producer to consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// A deliverer brings the goods to the consumer's address.
    HomeDelivery,

    /// The consumer collects from an agreed pickup point.
    PickupPoint,

    /// The consumer collects directly at the farm.
    FarmPickup,
}

impl DeliveryMethod {
    /// Returns true if fulfilling this method requires a deliverer.
    pub fn requires_deliverer(&self) -> bool {
        matches!(self, DeliveryMethod::HomeDelivery)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryMethod::HomeDelivery => "HomeDelivery",
            DeliveryMethod::PickupPoint => "PickupPoint",
            DeliveryMethod::FarmPickup => "FarmPickup",
        };
        write!(f, "{s}")
    }
}

/// A geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Where and how an order should be fulfilled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub method: DeliveryMethod,
    pub address: String,
    pub coordinates: Option<GeoPoint>,
    pub instructions: Option<String>,
}

impl DeliveryInfo {
    pub fn home_delivery(address: impl Into<String>) -> Self {
        Self {
            method: DeliveryMethod::HomeDelivery,
            address: address.into(),
            coordinates: None,
            instructions: None,
        }
    }

    pub fn pickup(method: DeliveryMethod, address: impl Into<String>) -> Self {
        Self {
            method,
            address: address.into(),
            coordinates: None,
            instructions: None,
        }
    }

    pub fn with_coordinates(mut self, point: GeoPoint) -> Self {
        self.coordinates = Some(point);
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// How the consumer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Settled in cash when the goods change hands.
    CashOnDelivery,

    /// Settled through a mobile money transfer.
    MobileMoney,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::CashOnDelivery => "CashOnDelivery",
            PaymentMethod::MobileMoney => "MobileMoney",
        };
        write!(f, "{s}")
    }
}

/// The result of a payment attempt against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// One entry in an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    pub updated_by: Actor,
}

impl StatusEntry {
    pub fn new(status: OrderStatus, at: DateTime<Utc>, updated_by: Actor) -> Self {
        Self {
            status,
            at,
            updated_by,
        }
    }
}
