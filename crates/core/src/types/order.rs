//! Order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus, Price, ProductId};

/// An order as listed by the backend.
///
/// The staff listing includes the customer and delivery details; the
/// customer's own listing leaves them out, hence the optional fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub product: Option<ProductId>,
    pub product_name: String,
    /// Username of the customer who placed the order.
    #[serde(default)]
    pub customer: Option<String>,
    pub quantity: u32,
    /// Computed by the backend as `quantity × price` at order time.
    pub total_price: Price,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Backend acknowledgement of a newly placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// Confirmation text from the backend.
    #[serde(default, alias = "success")]
    pub message: String,
}
