//! Order service: placing orders, listing them and moving their status.
//!
//! Status changes are optimistic. The [`OrderBook`] shows the new status at
//! once, the request is sent, and a failure puts the previous status back.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use vunjabei_core::{Order, OrderId, OrderStatus, PlacedOrder, ProductId, Role, Transition};

use crate::api::{ApiClient, Listing};
use crate::error::{ClientError, Result};
use crate::guards::SubmitGuard;

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every order in the shop (staff).
    All,
    /// The signed-in customer's own orders.
    Mine,
}

impl Scope {
    /// The scope a role sees by default.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Staff => Self::All,
            Role::Customer => Self::Mine,
        }
    }

    const fn endpoint(self) -> &'static str {
        match self {
            Self::All => "orders/",
            Self::Mine => "my-orders/",
        }
    }
}

/// Input of the order form.
///
/// Handed back untouched when placing fails, so it can be resubmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub product_id: ProductId,
    pub quantity: u32,
    pub phone: String,
    pub address: String,
}

impl PlaceOrder {
    /// Check the form against what the view displayed.
    ///
    /// `available` is the stock shown to the user, when known.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidInput` for a zero quantity, a blank
    /// phone or address, or a quantity above `available`.
    pub fn validate(&self, available: Option<u32>) -> Result<()> {
        if self.quantity == 0 {
            return Err(ClientError::InvalidInput(
                "Quantity must be a positive integer.".to_string(),
            ));
        }
        if self.phone.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Phone number is required.".to_string(),
            ));
        }
        if self.address.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Delivery address is required.".to_string(),
            ));
        }
        if let Some(available) = available.filter(|&stock| self.quantity > stock) {
            return Err(ClientError::InvalidInput(format!(
                "Only {available} in stock."
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PlaceOrderBody<'a> {
    product_id: ProductId,
    quantity: u32,
    phone: &'a str,
    address: &'a str,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: OrderStatus,
    username: &'a str,
}

/// The backend answers a status change with the updated order or a message.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusReply {
    Order(Box<Order>),
    Other(serde::de::IgnoredAny),
}

/// Tentative status change, resolved by [`OrderBook::commit`] or
/// [`OrderBook::rollback`].
#[derive(Debug)]
#[must_use = "a pending change must be committed or rolled back"]
pub struct PendingChange {
    order_id: OrderId,
    previous: OrderStatus,
    requested: OrderStatus,
}

impl PendingChange {
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Last confirmed status, restored on rollback.
    #[must_use]
    pub const fn previous(&self) -> OrderStatus {
        self.previous
    }

    #[must_use]
    pub const fn requested(&self) -> OrderStatus {
        self.requested
    }

    #[must_use]
    pub fn transition(&self) -> Transition {
        self.previous.classify(self.requested)
    }
}

/// The order list a view works on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders per status, in [`OrderStatus::ALL`] order.
    #[must_use]
    pub fn status_counts(&self) -> Vec<(OrderStatus, usize)> {
        OrderStatus::ALL
            .iter()
            .map(|&status| {
                let count = self.orders.iter().filter(|o| o.status == status).count();
                (status, count)
            })
            .collect()
    }

    /// Show `status` on the order before the backend confirms it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the order is not in the book.
    pub fn begin_change(&mut self, id: OrderId, status: OrderStatus) -> Result<PendingChange> {
        let order = self.get_mut(id)?;
        let previous = order.status;
        order.status = status;
        Ok(PendingChange {
            order_id: id,
            previous,
            requested: status,
        })
    }

    /// Keep the change. A record returned by the backend replaces the local one.
    pub fn commit(&mut self, change: PendingChange, confirmed: Option<Order>) {
        if let Ok(order) = self.get_mut(change.order_id) {
            match confirmed {
                Some(updated) if updated.id == change.order_id => *order = updated,
                _ => order.status = change.requested,
            }
        }
    }

    /// Undo the change, restoring the last confirmed status.
    pub fn rollback(&mut self, change: PendingChange) {
        if let Ok(order) = self.get_mut(change.order_id) {
            order.status = change.previous;
        }
    }

    fn get_mut(&mut self, id: OrderId) -> Result<&mut Order> {
        self.orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("order #{id}")))
    }
}

impl From<Listing<Order>> for OrderBook {
    fn from(listing: Listing<Order>) -> Self {
        Self::new(listing.into_items())
    }
}

/// Order operations.
#[derive(Debug, Clone)]
pub struct OrderService {
    api: ApiClient,
    submit: SubmitGuard,
}

impl OrderService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            submit: SubmitGuard::new(),
        }
    }

    #[must_use]
    pub const fn submit_guard(&self) -> &SubmitGuard {
        &self.submit
    }

    /// Place an order.
    ///
    /// `available` is the stock the view displayed, for the local check.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidInput` if the form fails [`PlaceOrder::validate`]
    /// - `ClientError::Validation` with the backend's text, e.g.
    ///   "Insufficient stock for this product."
    /// - `ClientError::NotFound` if the product is gone
    /// - `ClientError::Auth` without a backend session
    #[instrument(skip(self, order), fields(product_id = %order.product_id, quantity = order.quantity))]
    pub async fn place_order(&self, order: &PlaceOrder, available: Option<u32>) -> Result<PlacedOrder> {
        order.validate(available)?;
        let _submission = self.submit.begin()?;
        let body = PlaceOrderBody {
            product_id: order.product_id,
            quantity: order.quantity,
            phone: order.phone.trim(),
            address: order.address.trim(),
        };
        let placed: PlacedOrder = self
            .api
            .send_json(Method::POST, "place-order/", &body)
            .await?;
        tracing::info!(order_id = %placed.order_id, "Order placed");
        Ok(placed)
    }

    /// List orders, newest first as the backend sorts them.
    ///
    /// The username travels as a filter parameter; the backend decides what
    /// the session may see.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` if the session may not see the scope.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, scope: Scope, username: &str) -> Result<Listing<Order>> {
        self.api
            .get_listing(scope.endpoint(), &[("username", username)])
            .await
    }

    /// Change an order's status, optimistically.
    ///
    /// The book shows the new status during the request. On failure the
    /// previous status is restored and the error returned. Terminal orders
    /// are not blocked here; callers decide whether a
    /// [`Transition::FromTerminal`] change needs confirmation.
    ///
    /// # Errors
    ///
    /// - `ClientError::NotFound` if the order is not in the book or was deleted
    /// - `ClientError::Auth` if the session is not staff
    /// - `ClientError::Validation` if the backend rejects the status
    #[instrument(skip(self, book))]
    pub async fn update_status(
        &self,
        book: &mut OrderBook,
        id: OrderId,
        status: OrderStatus,
        username: &str,
    ) -> Result<Order> {
        let change = book.begin_change(id, status)?;
        let transition = change.transition();
        if !transition.is_routine() {
            tracing::warn!(from = %change.previous(), to = %status, "Changing a terminal order");
        }

        let body = StatusBody { status, username };
        let reply: Result<Option<StatusReply>> = self
            .api
            .send_json(Method::POST, &format!("orders/{id}/update-status/"), &body)
            .await;

        match reply {
            Ok(reply) => {
                let confirmed = match reply {
                    Some(StatusReply::Order(order)) => Some(*order),
                    _ => None,
                };
                book.commit(change, confirmed);
                tracing::info!(order_id = %id, status = %status, "Order status updated");
                book.get(id)
                    .cloned()
                    .ok_or_else(|| ClientError::NotFound(format!("order #{id}")))
            }
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "Status update failed, rolling back");
                book.rollback(change);
                Err(match e {
                    ClientError::NotFound(_) => ClientError::NotFound(format!("order #{id}")),
                    other => other,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn order(id: i64, status: OrderStatus) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "product_name": "Kitenge Shirt",
            "quantity": 1,
            "total_price": 25000.0,
            "status": status.as_str(),
            "date": "2025-02-01T10:15:00+00:00"
        }))
        .unwrap()
    }

    fn form(quantity: u32) -> PlaceOrder {
        PlaceOrder {
            product_id: ProductId::new(7),
            quantity,
            phone: "0712345678".to_string(),
            address: "Plot 4, Mwenge".to_string(),
        }
    }

    fn service() -> OrderService {
        OrderService::new(
            ApiClient::new(&ClientConfig::new("http://127.0.0.1:9/api/").unwrap()).unwrap(),
        )
    }

    #[test]
    fn test_scope_for_role() {
        assert_eq!(Scope::for_role(Role::Staff), Scope::All);
        assert_eq!(Scope::for_role(Role::Customer), Scope::Mine);
        assert_eq!(Scope::All.endpoint(), "orders/");
        assert_eq!(Scope::Mine.endpoint(), "my-orders/");
    }

    #[test]
    fn test_place_order_validation() {
        assert!(form(2).validate(Some(5)).is_ok());
        assert!(form(2).validate(None).is_ok());
        assert!(matches!(form(0).validate(None), Err(ClientError::InvalidInput(_))));
        assert!(matches!(form(6).validate(Some(5)), Err(ClientError::InvalidInput(_))));

        let mut blank_phone = form(1);
        blank_phone.phone = "  ".to_string();
        assert!(blank_phone.validate(None).is_err());
    }

    #[test]
    fn test_commit_and_rollback() {
        let mut book = OrderBook::new(vec![order(1, OrderStatus::Pending), order(2, OrderStatus::Shipped)]);

        let change = book.begin_change(OrderId::new(1), OrderStatus::Processing).unwrap();
        assert_eq!(change.transition(), Transition::Advance);
        assert_eq!(book.get(OrderId::new(1)).unwrap().status, OrderStatus::Processing);
        book.commit(change, None);
        assert_eq!(book.get(OrderId::new(1)).unwrap().status, OrderStatus::Processing);

        let change = book.begin_change(OrderId::new(2), OrderStatus::Cancelled).unwrap();
        assert_eq!(book.get(OrderId::new(2)).unwrap().status, OrderStatus::Cancelled);
        book.rollback(change);
        assert_eq!(book.get(OrderId::new(2)).unwrap().status, OrderStatus::Shipped);
    }

    #[test]
    fn test_commit_prefers_returned_record() {
        let mut book = OrderBook::new(vec![order(1, OrderStatus::Pending)]);
        let change = book.begin_change(OrderId::new(1), OrderStatus::Shipped).unwrap();
        let mut returned = order(1, OrderStatus::Shipped);
        returned.customer = Some("alice".to_string());
        book.commit(change, Some(returned.clone()));
        assert_eq!(book.get(OrderId::new(1)), Some(&returned));
    }

    #[test]
    fn test_begin_change_unknown_order() {
        let mut book = OrderBook::default();
        let err = book.begin_change(OrderId::new(3), OrderStatus::Shipped).unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[test]
    fn test_status_counts() {
        let book = OrderBook::new(vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Pending),
            order(3, OrderStatus::Delivered),
        ]);
        let counts = book.status_counts();
        assert_eq!(counts.first(), Some(&(OrderStatus::Pending, 2)));
        assert!(counts.contains(&(OrderStatus::Delivered, 1)));
        assert!(counts.contains(&(OrderStatus::Cancelled, 0)));
    }

    #[test]
    fn test_status_reply_shapes() {
        let reply: Option<StatusReply> =
            serde_json::from_str(r#"{"message": "Status updated successfully."}"#).unwrap();
        assert!(matches!(reply, Some(StatusReply::Other(_))));
        let reply: Option<StatusReply> = serde_json::from_str("null").unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_failed_update_rolls_back() {
        let mut book = OrderBook::new(vec![order(1, OrderStatus::Pending)]);
        let err = service()
            .update_status(&mut book, OrderId::new(1), OrderStatus::Processing, "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unreachable(_)));
        assert_eq!(book.get(OrderId::new(1)).unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_invalid_order_sends_nothing() {
        let err = service().place_order(&form(10), Some(5)).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
