//! Mock backend handlers.
//!
//! ```text
//! GET  /api/health/
//! POST /api/login/
//! POST /api/register/
//! POST /api/register-staff/                  (staff)
//! GET  /api/products/            POST        (multipart)
//! GET  /api/products/{id}/       PUT DELETE
//! GET  /api/products/low_stock/
//! GET  /api/products/by_category/?category_id=
//! GET  /api/categories/          POST
//! GET  /api/categories/{id}/     PUT DELETE
//! GET  /api/customers/                       (staff, paginated)
//! GET  /api/sales/                           (staff)
//! POST /api/place-order/                     (signed in)
//! GET  /api/orders/                          (staff)
//! GET  /api/my-orders/                       (signed in)
//! POST /api/orders/{id}/update-status/       (staff)
//! ```
//!
//! Response bodies and messages follow the real backend.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::shop::{STATUSES, Shop, StoredOrder, StoredProduct, User, now};

pub type Shared = Arc<Mutex<Shop>>;

pub fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/login/", post(login))
        .route("/api/register/", post(register))
        .route("/api/register-staff/", post(register_staff))
        .route("/api/products/", get(list_products).post(create_product))
        .route("/api/products/low_stock/", get(low_stock))
        .route("/api/products/by_category/", get(by_category))
        .route(
            "/api/products/{id}/",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/categories/", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}/",
            get(get_category).put(rename_category).delete(delete_category),
        )
        .route("/api/customers/", get(customers))
        .route("/api/sales/", get(sales))
        .route("/api/place-order/", post(place_order))
        .route("/api/orders/", get(all_orders))
        .route("/api/my-orders/", get(my_orders))
        .route("/api/orders/{id}/update-status/", post(update_status))
        .with_state(state)
}

fn lock(state: &Shared) -> MutexGuard<'_, Shop> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Responses
// =============================================================================

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn field_errors(errors: &BTreeMap<&str, &str>) -> Response {
    let body: serde_json::Map<String, Value> = errors
        .iter()
        .map(|(field, message)| ((*field).to_string(), json!([message])))
        .collect();
    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}

fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "<h1>Server Error (500)</h1>",
    )
        .into_response()
}

fn not_signed_in() -> Response {
    detail(
        StatusCode::FORBIDDEN,
        "Authentication credentials were not provided.",
    )
}

fn not_permitted() -> Response {
    detail(
        StatusCode::FORBIDDEN,
        "You do not have permission to perform this action.",
    )
}

fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Not found.")
}

/// Staff user of the request, or the permission error to return.
fn require_staff(shop: &Shop, headers: &HeaderMap) -> Result<User, Response> {
    match shop.user_for(headers) {
        None => Err(not_signed_in()),
        Some(user) if !user.is_staff => Err(not_permitted()),
        Some(user) => Ok(user),
    }
}

// =============================================================================
// Accounts
// =============================================================================

async fn health(State(state): State<Shared>) -> Response {
    if !lock(&state).admit("health") {
        return server_error();
    }
    Json(json!({ "status": "ok", "service": "vunjabei-api" })).into_response()
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("login") {
        return server_error();
    }

    let identifier = body.username.trim();
    let password = body.password.trim();
    if identifier.is_empty() || password.is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            "Username/Email and password are required.",
        );
    }
    let Some(user) = shop.find_login(identifier).cloned() else {
        return error(
            StatusCode::BAD_REQUEST,
            "User does not exist. Please register first.",
        );
    };
    if user.password != password {
        return error(
            StatusCode::BAD_REQUEST,
            "Incorrect password. Password is case-sensitive.",
        );
    }

    let token = format!("session-{}", shop.next_id());
    shop.sessions.insert(token.clone(), user.username.clone());
    (
        [(header::SET_COOKIE, format!("sessionid={token}; Path=/; HttpOnly"))],
        Json(json!({ "username": user.username, "is_staff": user.is_staff })),
    )
        .into_response()
}

fn create_account(shop: &mut Shop, body: &Credentials, is_staff: bool) -> Response {
    let username = body.username.trim().to_lowercase();
    let password = body.password.trim();
    if username.is_empty() || password.is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            "Username and password are required.",
        );
    }
    if shop.users.iter().any(|u| u.username.eq_ignore_ascii_case(&username)) {
        return error(StatusCode::BAD_REQUEST, "Username already exists.");
    }
    shop.add_user(&username, body.email.trim(), password, is_staff);
    let message = if is_staff {
        "Admin registration successful. Please login."
    } else {
        "Registration successful. Please login."
    };
    (StatusCode::CREATED, Json(json!({ "success": message }))).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("register") {
        return server_error();
    }
    create_account(&mut shop, &body, false)
}

async fn register_staff(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Credentials>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("register-staff") {
        return server_error();
    }
    if let Err(denied) = require_staff(&shop, &headers) {
        return denied;
    }
    create_account(&mut shop, &body, true)
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    let items = shop.products_json(shop.products.values());
    if shop.paginate_products {
        Json(json!({
            "count": items.len(),
            "next": null,
            "previous": null,
            "results": items,
        }))
        .into_response()
    } else {
        Json(items).into_response()
    }
}

async fn get_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    match shop.products.get(&id) {
        Some(product) => Json(shop.product_json(product)).into_response(),
        None => detail(StatusCode::NOT_FOUND, "No Product matches the given query."),
    }
}

async fn low_stock(State(state): State<Shared>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    Json(shop.products_json(shop.products.values().filter(|p| p.quantity < 10))).into_response()
}

#[derive(Deserialize)]
struct CategoryFilter {
    category_id: Option<i64>,
}

async fn by_category(
    State(state): State<Shared>,
    Query(filter): Query<CategoryFilter>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    let items = shop.products_json(
        shop.products
            .values()
            .filter(|p| filter.category_id.is_none_or(|id| p.category == Some(id))),
    );
    Json(items).into_response()
}

#[derive(Default)]
struct ProductFields {
    name: Option<String>,
    category: Option<String>,
    price: Option<String>,
    quantity: Option<String>,
    image: Option<String>,
}

async fn read_product_fields(mut multipart: Multipart) -> Result<ProductFields, Response> {
    let mut fields = ProductFields::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(detail(StatusCode::BAD_REQUEST, &e.body_text())),
        };
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            if field.bytes().await.is_err() {
                return Err(detail(StatusCode::BAD_REQUEST, "Upload a valid image."));
            }
            fields.image = Some(file_name);
            continue;
        }
        let Ok(text) = field.text().await else {
            return Err(detail(StatusCode::BAD_REQUEST, "Malformed form field."));
        };
        match name.as_str() {
            "name" => fields.name = Some(text),
            "category" => fields.category = Some(text),
            "price" => fields.price = Some(text),
            "quantity" => fields.quantity = Some(text),
            _ => {}
        }
    }
    Ok(fields)
}

struct ValidProduct {
    name: String,
    category: Option<i64>,
    price: Decimal,
    quantity: u32,
}

fn validate_product(shop: &Shop, fields: &ProductFields) -> Result<ValidProduct, Response> {
    let mut errors = BTreeMap::new();

    let name = fields.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        errors.insert("name", "This field may not be blank.");
    }

    let price = fields
        .price
        .as_deref()
        .and_then(|raw| raw.trim().parse::<Decimal>().ok());
    if price.is_none() {
        errors.insert("price", "A valid number is required.");
    }

    let quantity = fields
        .quantity
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u32>().ok());
    if quantity.is_none() {
        errors.insert("quantity", "A valid integer is required.");
    }

    let category = match fields.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) if shop.categories.contains_key(&id) => Some(id),
            _ => {
                errors.insert("category", "Invalid pk - object does not exist.");
                None
            }
        },
    };

    match (price, quantity) {
        (Some(price), Some(quantity)) if errors.is_empty() => Ok(ValidProduct {
            name: name.to_string(),
            category,
            price,
            quantity,
        }),
        _ => Err(field_errors(&errors)),
    }
}

async fn create_product(State(state): State<Shared>, multipart: Multipart) -> Response {
    let fields = match read_product_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    let valid = match validate_product(&shop, &fields) {
        Ok(valid) => valid,
        Err(response) => return response,
    };

    let id = shop.next_id();
    let image = fields
        .image
        .map(|file| format!("{}product_images/{file}", shop.media_base));
    let product = StoredProduct {
        id,
        name: valid.name,
        category: valid.category,
        price: valid.price,
        quantity: valid.quantity,
        image,
        created_at: now(),
        updated_at: now(),
    };
    let body = shop.product_json(&product);
    shop.products.insert(id, product);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    let fields = match read_product_fields(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    if !shop.products.contains_key(&id) {
        return detail(StatusCode::NOT_FOUND, "No Product matches the given query.");
    }
    let valid = match validate_product(&shop, &fields) {
        Ok(valid) => valid,
        Err(response) => return response,
    };

    let media_base = shop.media_base.clone();
    let Some(product) = shop.products.get_mut(&id) else {
        return not_found();
    };
    product.name = valid.name;
    product.category = valid.category;
    product.price = valid.price;
    product.quantity = valid.quantity;
    if let Some(file) = fields.image {
        product.image = Some(format!("{media_base}product_images/{file}"));
    }
    product.updated_at = now();
    let product = product.clone();
    Json(shop.product_json(&product)).into_response()
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("products") {
        return server_error();
    }
    match shop.products.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => detail(StatusCode::NOT_FOUND, "No Product matches the given query."),
    }
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Deserialize)]
struct CategoryBody {
    #[serde(default)]
    name: String,
}

async fn list_categories(State(state): State<Shared>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("categories") {
        return server_error();
    }
    let items: Vec<Value> = shop
        .categories
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    Json(items).into_response()
}

async fn get_category(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("categories") {
        return server_error();
    }
    shop.category_json(id)
        .map_or_else(not_found, |body| Json(body).into_response())
}

async fn create_category(
    State(state): State<Shared>,
    Json(body): Json<CategoryBody>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("categories") {
        return server_error();
    }
    let name = body.name.trim();
    if name.is_empty() {
        return field_errors(&BTreeMap::from([("name", "This field may not be blank.")]));
    }
    let id = shop.next_id();
    shop.categories.insert(id, name.to_string());
    (StatusCode::CREATED, Json(json!({ "id": id, "name": name }))).into_response()
}

async fn rename_category(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryBody>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("categories") {
        return server_error();
    }
    let name = body.name.trim();
    if name.is_empty() {
        return field_errors(&BTreeMap::from([("name", "This field may not be blank.")]));
    }
    match shop.categories.get_mut(&id) {
        Some(existing) => {
            name.clone_into(existing);
            Json(json!({ "id": id, "name": name })).into_response()
        }
        None => not_found(),
    }
}

async fn delete_category(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("categories") {
        return server_error();
    }
    if shop.categories.remove(&id).is_none() {
        return not_found();
    }
    for product in shop.products.values_mut() {
        if product.category == Some(id) {
            product.category = None;
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Dashboard sources
// =============================================================================

async fn customers(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("customers") {
        return server_error();
    }
    if let Err(denied) = require_staff(&shop, &headers) {
        return denied;
    }
    Json(json!({
        "count": shop.customers.len(),
        "next": null,
        "previous": null,
        "results": shop.customers,
    }))
    .into_response()
}

async fn sales(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("sales") {
        return server_error();
    }
    if let Err(denied) = require_staff(&shop, &headers) {
        return denied;
    }
    Json(shop.sales.clone()).into_response()
}

// =============================================================================
// Orders
// =============================================================================

/// Read an integer sent either as a JSON number or a numeric string.
fn int_field(body: &Value, key: &str) -> Option<i64> {
    match body.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(body: &Value, key: &str) -> String {
    body.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

async fn place_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("place-order") {
        return server_error();
    }
    let Some(user) = shop.user_for(&headers) else {
        return not_signed_in();
    };

    let Some(product_id) = int_field(&body, "product_id") else {
        return error(StatusCode::BAD_REQUEST, "Product ID is required.");
    };
    let quantity = match body.get("quantity") {
        None => Some(1),
        Some(_) => int_field(&body, "quantity"),
    };
    let Some(quantity) = quantity
        .filter(|q| *q > 0)
        .and_then(|q| u32::try_from(q).ok())
    else {
        return error(
            StatusCode::BAD_REQUEST,
            "Quantity must be a positive integer.",
        );
    };

    let order_id = shop.next_id();
    let Some(product) = shop.products.get_mut(&product_id) else {
        return error(StatusCode::NOT_FOUND, "Product not found.");
    };
    if product.quantity < quantity {
        return error(
            StatusCode::BAD_REQUEST,
            "Insufficient stock for this product.",
        );
    }
    product.quantity -= quantity;
    let order = StoredOrder {
        id: order_id,
        product_id,
        product_name: product.name.clone(),
        username: user.username,
        quantity,
        total: product.price * Decimal::from(quantity),
        phone: text_field(&body, "phone"),
        address: text_field(&body, "address"),
        date: now(),
        status: STATUSES[0].to_string(),
    };
    shop.orders.push(order);

    (
        StatusCode::CREATED,
        Json(json!({ "success": "Order placed successfully.", "order_id": order_id })),
    )
        .into_response()
}

async fn all_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("orders") {
        return server_error();
    }
    match shop.user_for(&headers) {
        None => not_signed_in(),
        Some(user) if !user.is_staff => error(StatusCode::FORBIDDEN, "Admin access required."),
        Some(_) => {
            let items: Vec<Value> = shop.orders.iter().rev().map(StoredOrder::staff_json).collect();
            Json(items).into_response()
        }
    }
}

async fn my_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("my-orders") {
        return server_error();
    }
    let Some(user) = shop.user_for(&headers) else {
        return not_signed_in();
    };
    let items: Vec<Value> = shop
        .orders
        .iter()
        .rev()
        .filter(|o| o.username == user.username)
        .map(StoredOrder::customer_json)
        .collect();
    Json(items).into_response()
}

async fn update_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = lock(&state);
    if !shop.admit("update-status") {
        return server_error();
    }
    match shop.user_for(&headers) {
        None => return not_signed_in(),
        Some(user) if !user.is_staff => {
            return error(StatusCode::FORBIDDEN, "Admin access required.");
        }
        Some(_) => {}
    }

    let Some(order) = shop.orders.iter_mut().find(|o| o.id == id) else {
        return not_found();
    };
    let status = text_field(&body, "status");
    if status.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Status is required.");
    }
    if !STATUSES.contains(&status.as_str()) {
        return error(StatusCode::BAD_REQUEST, "Invalid status value.");
    }
    order.status = status;
    Json(json!({ "message": "Status updated successfully." })).into_response()
}
