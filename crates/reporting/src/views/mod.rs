//! Read model views for dashboards.

pub mod deliverer_stats;
pub mod open_orders;
pub mod order_status;

pub use deliverer_stats::{DelivererStats, DelivererStatsView, DeliveryCompletion};
pub use open_orders::{OpenOrderSummary, OpenOrdersView};
pub use order_status::{OrderStatusView, OrderSummary};
