//! Staff dashboard figures.
//!
//! Built from three independent fetches. Each one that fails is logged and
//! counted as zero so one broken endpoint does not blank the whole overview.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::instrument;
use vunjabei_core::{Price, Product};

use crate::api::{ApiClient, Listing};
use crate::error::Result;

/// Overview shown on the admin landing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub products: u64,
    pub low_stock: u64,
    pub customers: u64,
    pub sales: u64,
    pub revenue: Price,
}

#[derive(Deserialize)]
struct SaleRecord {
    #[serde(default)]
    total_amount: Option<Decimal>,
}

impl DashboardStats {
    /// Fetch products, customers and sales concurrently.
    #[instrument(skip(api))]
    pub async fn load(api: &ApiClient) -> Self {
        let (products, customers, sales) = tokio::join!(
            api.get_listing::<Product>("products/", &[]),
            api.get_listing::<IgnoredAny>("customers/", &[]),
            api.get_listing::<SaleRecord>("sales/", &[]),
        );

        let products = best_effort("products", products);
        let customers = best_effort("customers", customers);
        let sales = best_effort("sales", sales);

        let revenue: Decimal = sales.iter().filter_map(|sale| sale.total_amount).sum();

        Self {
            products: products.total(),
            low_stock: products.iter().filter(|p| p.is_low_stock()).count() as u64,
            customers: customers.total(),
            sales: sales.len() as u64,
            revenue: Price::new(revenue).unwrap_or(Price::ZERO),
        }
    }
}

fn best_effort<T>(what: &str, result: Result<Listing<T>>) -> Listing<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(source = what, error = %e, "Dashboard figure unavailable");
        Listing::default()
    })
}
