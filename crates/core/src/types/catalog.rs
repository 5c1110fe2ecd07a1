//! Product and category records as served by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CategoryId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product in the catalog.
///
/// A product with `quantity == 0` stays listed but cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Category reference; the backend nulls it when the category is deleted.
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Category name, filled in by the backend for display.
    #[serde(default)]
    pub category_name: Option<String>,
    pub price: Price,
    /// Units in stock.
    pub quantity: u32,
    /// Absolute image URL, if the product has one.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Stock level below which a product counts as low stock.
    pub const LOW_STOCK_THRESHOLD: u32 = 10;

    /// Whether at least one unit can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Whether stock is below [`Self::LOW_STOCK_THRESHOLD`].
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity < Self::LOW_STOCK_THRESHOLD
    }

    /// Label shown on product cards; new products may lack a category.
    #[must_use]
    pub fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or("New")
    }
}
