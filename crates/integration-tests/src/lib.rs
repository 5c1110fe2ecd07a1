//! Integration tests for Vunjabei.
//!
//! The tests drive `vunjabei-client` against [`MockBackend`], an in-memory
//! shop served over real HTTP on a loopback port. The mock mirrors the
//! backend's endpoints, permission checks, response shapes and messages.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p vunjabei-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_flow` - Login, registration, persistence and logout
//! - `catalog` - Product and category management
//! - `orders` - Placing orders and staff status updates
//! - `dashboard` - Staff dashboard figures and partial failures
//! - `unreachable` - Behavior when no backend answers

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vunjabei_client::{ClientConfig, ConfigError};
use vunjabei_core::{CategoryId, OrderId, OrderStatus, ProductId};

mod routes;
mod shop;

use shop::{Shop, StoredOrder, StoredProduct, now};

/// An in-memory shop backend listening on `127.0.0.1`.
///
/// The server task is aborted when the backend is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: routes::Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(Mutex::new(Shop::new(format!("http://{addr}/media/"))));

        let app = routes::router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            // Serving only ends when the task is aborted.
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the API, ending in `/api/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// Client configuration pointing at this backend, keeping state in
    /// `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is rejected.
    pub fn config(&self, state_dir: &Path) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::new(&self.base_url())?;
        config.state_dir = state_dir.to_path_buf();
        Ok(config)
    }

    fn shop(&self) -> MutexGuard<'_, Shop> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Add an account. Non-staff accounts also get a customer record.
    pub fn add_user(&self, username: &str, email: &str, password: &str, is_staff: bool) {
        self.shop().add_user(username, email, password, is_staff);
    }

    pub fn add_category(&self, name: &str) -> CategoryId {
        let mut shop = self.shop();
        let id = shop.next_id();
        shop.categories.insert(id, name.to_string());
        CategoryId::new(id)
    }

    /// Add a product priced in whole shillings.
    pub fn add_product(
        &self,
        name: &str,
        price: i64,
        quantity: u32,
        category: Option<CategoryId>,
    ) -> ProductId {
        let mut shop = self.shop();
        let id = shop.next_id();
        shop.products.insert(
            id,
            StoredProduct {
                id,
                name: name.to_string(),
                category: category.map(|c| c.get()),
                price: Decimal::from(price),
                quantity,
                image: None,
                created_at: now(),
                updated_at: now(),
            },
        );
        ProductId::new(id)
    }

    /// Record an order directly, without touching stock.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub fn add_order(
        &self,
        username: &str,
        product: ProductId,
        quantity: u32,
        status: OrderStatus,
    ) -> OrderId {
        let mut shop = self.shop();
        let id = shop.next_id();
        let Some(stored) = shop.products.get(&product.get()).cloned() else {
            panic!("add_order: no product #{product}");
        };
        shop.orders.push(StoredOrder {
            id,
            product_id: stored.id,
            product_name: stored.name,
            username: username.to_string(),
            quantity,
            total: stored.price * Decimal::from(quantity),
            phone: "0712345678".to_string(),
            address: "Plot 4, Mikocheni".to_string(),
            date: now(),
            status: status.as_str().to_string(),
        });
        OrderId::new(id)
    }

    /// Add a sale record with the given total in whole shillings.
    pub fn add_sale(&self, total: i64) {
        let mut shop = self.shop();
        let id = shop.next_id();
        shop.sales.push(json!({
            "id": id,
            "customer": null,
            "product": null,
            "quantity": 1,
            "total_amount": format!("{:.2}", Decimal::from(total)),
            "date": now(),
        }));
    }

    // =========================================================================
    // Inspection and control
    // =========================================================================

    #[must_use]
    pub fn product_quantity(&self, product: ProductId) -> Option<u32> {
        self.shop().products.get(&product.get()).map(|p| p.quantity)
    }

    #[must_use]
    pub fn product_exists(&self, product: ProductId) -> bool {
        self.shop().products.contains_key(&product.get())
    }

    #[must_use]
    pub fn order_status(&self, order: OrderId) -> Option<String> {
        self.shop()
            .orders
            .iter()
            .find(|o| o.id == order.get())
            .map(|o| o.status.clone())
    }

    #[must_use]
    pub fn order_count(&self) -> usize {
        self.shop().orders.len()
    }

    /// Make every request to `endpoint` fail with an HTML 500 page.
    ///
    /// Endpoint names are the path segment after `/api/`, e.g. `customers`,
    /// `place-order` or `update-status`.
    pub fn set_failing(&self, endpoint: &str, failing: bool) {
        let mut shop = self.shop();
        if failing {
            shop.failing.insert(endpoint.to_string());
        } else {
            shop.failing.remove(endpoint);
        }
    }

    /// Serve product listings in a `{count, next, previous, results}`
    /// envelope instead of a bare array.
    pub fn paginate_products(&self, paginate: bool) {
        self.shop().paginate_products = paginate;
    }

    /// Number of requests that reached `endpoint`.
    #[must_use]
    pub fn hits(&self, endpoint: &str) -> usize {
        self.shop().hits.get(endpoint).copied().unwrap_or_default()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
