//! Placing orders and staff status updates against the mock backend.

#![allow(clippy::unwrap_used)]

mod common;

use vunjabei_client::{ClientError, OrderBook, OrderService, PlaceOrder, Scope};
use vunjabei_core::{OrderId, OrderStatus, ProductId, Transition};

use common::Fixture;

fn order_form(product_id: ProductId, quantity: u32) -> PlaceOrder {
    PlaceOrder {
        product_id,
        quantity,
        phone: "0712345678".to_string(),
        address: "Plot 4, Mwenge".to_string(),
    }
}

#[tokio::test]
async fn test_placing_an_order_decrements_stock() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kitenge Shirt", 25_000, 5, None);
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());

    let placed = service
        .place_order(&order_form(product, 2), Some(5))
        .await
        .unwrap();

    assert_eq!(placed.message, "Order placed successfully.");
    assert_eq!(fx.backend.product_quantity(product), Some(3));

    let mine = service.list_orders(Scope::Mine, "alice").await.unwrap();
    let order = mine.iter().next().unwrap();
    assert_eq!(order.id, placed.order_id);
    assert_eq!(order.quantity, 2);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price.display(), "TSh 50,000.00");
    assert_eq!(order.customer, None);
}

#[tokio::test]
async fn test_insufficient_stock_shows_backend_text_and_keeps_form() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kitenge Shirt", 25_000, 5, None);
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());

    // Stock unknown to the view, so only the backend can refuse.
    let form = order_form(product, 10);
    let err = service.place_order(&form, None).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation { .. }));
    assert_eq!(err.to_string(), "Insufficient stock for this product.");
    assert_eq!(form, order_form(product, 10));
    assert_eq!(fx.backend.product_quantity(product), Some(5));
    assert_eq!(fx.backend.order_count(), 0);
    assert!(!service.submit_guard().is_busy());
}

#[tokio::test]
async fn test_known_stock_is_checked_before_sending() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kitenge Shirt", 25_000, 5, None);
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());

    let err = service
        .place_order(&order_form(product, 10), Some(5))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Only 5 in stock.");
    assert_eq!(fx.backend.hits("place-order"), 0);
}

#[tokio::test]
async fn test_order_for_deleted_product() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());

    let err = service
        .place_order(&order_form(ProductId::new(77), 1), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_in_flight_order_sends_nothing() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 5, None);
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());

    let _held = service.submit_guard().begin().unwrap();
    let err = service
        .place_order(&order_form(product, 1), Some(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::SubmissionInFlight));
    assert_eq!(fx.backend.hits("place-order"), 0);
}

#[tokio::test]
async fn test_staff_listing_is_newest_first_with_delivery_details() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let first = fx.backend.add_order("alice", product, 1, OrderStatus::Delivered);
    let second = fx.backend.add_order("alice", product, 3, OrderStatus::Pending);
    let sessions = fx.signed_in("admin").await;

    let book = OrderBook::from(
        OrderService::new(sessions.api().clone())
            .list_orders(Scope::All, "admin")
            .await
            .unwrap(),
    );

    let ids: Vec<OrderId> = book.orders().iter().map(|o| o.id).collect();
    assert_eq!(ids, [second, first]);
    let newest = book.get(second).unwrap();
    assert_eq!(newest.customer.as_deref(), Some("alice"));
    assert_eq!(newest.phone.as_deref(), Some("0712345678"));

    let counts = book.status_counts();
    assert!(counts.contains(&(OrderStatus::Pending, 1)));
    assert!(counts.contains(&(OrderStatus::Delivered, 1)));
}

#[tokio::test]
async fn test_customer_cannot_list_all_orders() {
    let fx = Fixture::new().await;
    let sessions = fx.signed_in("alice").await;

    let err = OrderService::new(sessions.api().clone())
        .list_orders(Scope::All, "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Auth(_)));
    assert_eq!(err.to_string(), "Admin access required.");
}

#[tokio::test]
async fn test_status_update_is_applied() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let id = fx.backend.add_order("alice", product, 1, OrderStatus::Pending);
    let sessions = fx.signed_in("admin").await;
    let service = OrderService::new(sessions.api().clone());
    let mut book = OrderBook::from(service.list_orders(Scope::All, "admin").await.unwrap());

    let order = service
        .update_status(&mut book, id, OrderStatus::Processing, "admin")
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(book.get(id).unwrap().status, OrderStatus::Processing);
    assert_eq!(fx.backend.order_status(id).as_deref(), Some("Processing"));
}

#[tokio::test]
async fn test_repeating_a_status_is_harmless() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let id = fx.backend.add_order("alice", product, 1, OrderStatus::Shipped);
    let sessions = fx.signed_in("admin").await;
    let service = OrderService::new(sessions.api().clone());
    let mut book = OrderBook::from(service.list_orders(Scope::All, "admin").await.unwrap());

    for _ in 0..2 {
        let order = service
            .update_status(&mut book, id, OrderStatus::Shipped, "admin")
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
    }
    assert_eq!(fx.backend.order_status(id).as_deref(), Some("Shipped"));
}

#[tokio::test]
async fn test_failed_status_update_rolls_back() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let id = fx.backend.add_order("alice", product, 1, OrderStatus::Pending);
    let sessions = fx.signed_in("admin").await;
    let service = OrderService::new(sessions.api().clone());
    let mut book = OrderBook::from(service.list_orders(Scope::All, "admin").await.unwrap());

    fx.backend.set_failing("update-status", true);
    let err = service
        .update_status(&mut book, id, OrderStatus::Shipped, "admin")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Server { status: 500, .. }));
    assert_eq!(book.get(id).unwrap().status, OrderStatus::Pending);
    assert_eq!(fx.backend.order_status(id).as_deref(), Some("Pending"));
}

#[tokio::test]
async fn test_terminal_orders_can_still_be_changed() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let id = fx.backend.add_order("alice", product, 1, OrderStatus::Delivered);
    let sessions = fx.signed_in("admin").await;
    let service = OrderService::new(sessions.api().clone());
    let mut book = OrderBook::from(service.list_orders(Scope::All, "admin").await.unwrap());

    assert_eq!(
        OrderStatus::Delivered.classify(OrderStatus::Pending),
        Transition::FromTerminal
    );
    service
        .update_status(&mut book, id, OrderStatus::Pending, "admin")
        .await
        .unwrap();
    assert_eq!(fx.backend.order_status(id).as_deref(), Some("Pending"));
}

#[tokio::test]
async fn test_customer_cannot_change_status() {
    let fx = Fixture::new().await;
    let product = fx.backend.add_product("Kanga", 8_000, 50, None);
    let id = fx.backend.add_order("alice", product, 1, OrderStatus::Pending);
    let sessions = fx.signed_in("alice").await;
    let service = OrderService::new(sessions.api().clone());
    let mut book = OrderBook::from(service.list_orders(Scope::Mine, "alice").await.unwrap());

    let err = service
        .update_status(&mut book, id, OrderStatus::Cancelled, "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Auth(_)));
    assert_eq!(book.get(id).unwrap().status, OrderStatus::Pending);
}
