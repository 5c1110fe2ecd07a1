//! Order commands.

use vunjabei_client::{CatalogService, OrderBook, OrderService, PlaceOrder, Scope};
use vunjabei_core::{OrderId, OrderStatus, ProductId, Route};

use super::{App, CliError, load};
use crate::render;

/// Place an order from the product's detail screen.
///
/// The product is loaded first so the stock the customer saw is checked
/// before anything is sent.
pub async fn place(
    app: &App,
    product_id: ProductId,
    quantity: u32,
    phone: String,
    address: String,
) -> Result<(), CliError> {
    app.enter(Route::CustomerProduct(product_id))?;
    let product = load(
        "product",
        CatalogService::new(app.api.clone()).get_product(product_id),
    )
    .await?;
    if !product.in_stock() {
        return Err(CliError::Aborted(format!("{} is sold out.", product.name)));
    }

    let order = PlaceOrder {
        product_id,
        quantity,
        phone,
        address,
    };
    let placed = OrderService::new(app.api.clone())
        .place_order(&order, Some(product.quantity))
        .await?;

    render::message(&format!(
        "{} Order #{}: {} x{} for {}.",
        if placed.message.is_empty() {
            "Order placed successfully!"
        } else {
            placed.message.as_str()
        },
        placed.order_id,
        product.name,
        order.quantity,
        product.price.times(order.quantity).display()
    ));
    render::message(&format!("See {}", Route::CustomerOrders.path()));
    Ok(())
}

pub async fn mine(app: &App) -> Result<(), CliError> {
    let session = app.enter(Route::CustomerOrders)?;
    let listing = load(
        "your orders",
        OrderService::new(app.api.clone()).list_orders(Scope::Mine, &session.username),
    )
    .await?;
    render::orders(&OrderBook::from(listing), None);
    Ok(())
}

pub async fn list(app: &App, status: Option<OrderStatus>) -> Result<(), CliError> {
    let session = app.enter(Route::AdminOrders)?;
    let listing = load(
        "orders",
        OrderService::new(app.api.clone()).list_orders(Scope::All, &session.username),
    )
    .await?;
    render::orders(&OrderBook::from(listing), status);
    Ok(())
}

/// Change an order's status. Orders already delivered or cancelled need
/// `--force`.
pub async fn set_status(
    app: &App,
    id: OrderId,
    status: OrderStatus,
    force: bool,
) -> Result<(), CliError> {
    let session = app.enter(Route::AdminOrders)?;
    let service = OrderService::new(app.api.clone());
    let mut book = OrderBook::from(
        load("orders", service.list_orders(Scope::All, &session.username)).await?,
    );

    let current = book
        .get(id)
        .map(|order| order.status)
        .ok_or_else(|| vunjabei_client::ClientError::NotFound(format!("order #{id}")))?;

    let transition = current.classify(status);
    if !transition.is_routine() && !force {
        return Err(CliError::Aborted(format!(
            "Order #{id} left as {current} (use --force to change a {current} order)."
        )));
    }

    let order = service
        .update_status(&mut book, id, status, &session.username)
        .await?;
    render::message(&format!("Order #{} is now {}.", order.id, order.status));
    Ok(())
}
