//! In-memory shop state behind the mock backend.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::http::{HeaderMap, header};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub id: i64,
    pub name: String,
    pub category: Option<i64>,
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub username: String,
    pub quantity: u32,
    pub total: Decimal,
    pub phone: String,
    pub address: String,
    pub date: String,
    pub status: String,
}

pub const STATUSES: [&str; 5] = ["Pending", "Processing", "Shipped", "Delivered", "Cancelled"];

#[derive(Debug, Default)]
pub struct Shop {
    pub users: Vec<User>,
    /// Session cookie value to username.
    pub sessions: HashMap<String, String>,
    pub categories: BTreeMap<i64, String>,
    pub products: BTreeMap<i64, StoredProduct>,
    pub orders: Vec<StoredOrder>,
    pub customers: Vec<Value>,
    pub sales: Vec<Value>,
    pub failing: HashSet<String>,
    pub hits: HashMap<String, usize>,
    pub paginate_products: bool,
    pub media_base: String,
    next_id: i64,
}

impl Shop {
    /// An empty shop whose image URLs start with `media_base`.
    pub fn new(media_base: String) -> Self {
        Self {
            media_base,
            ..Self::default()
        }
    }

    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Count a request to `endpoint`; `false` if the endpoint is set to fail.
    pub fn admit(&mut self, endpoint: &str) -> bool {
        *self.hits.entry(endpoint.to_string()).or_default() += 1;
        !self.failing.contains(endpoint)
    }

    /// The user whose session cookie the request carries.
    pub fn user_for(&self, headers: &HeaderMap) -> Option<User> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let token = cookies
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix("sessionid="))?;
        let username = self.sessions.get(token)?;
        self.users.iter().find(|u| &u.username == username).cloned()
    }

    /// Resolve a login identifier the way the backend does: exact username,
    /// then case-insensitive username, then email.
    pub fn find_login(&self, identifier: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.username == identifier)
            .or_else(|| {
                self.users
                    .iter()
                    .find(|u| u.username.eq_ignore_ascii_case(identifier))
            })
            .or_else(|| {
                self.users
                    .iter()
                    .find(|u| !u.email.is_empty() && u.email.eq_ignore_ascii_case(identifier))
            })
    }

    pub fn add_user(&mut self, username: &str, email: &str, password: &str, is_staff: bool) {
        self.users.push(User {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            is_staff,
        });
        if !is_staff {
            let id = self.next_id();
            self.customers.push(json!({
                "id": id,
                "name": username,
                "phone": null,
                "address": null,
                "created_at": now(),
            }));
        }
    }

    pub fn product_json(&self, product: &StoredProduct) -> Value {
        json!({
            "id": product.id,
            "name": product.name,
            "category": product.category,
            "category_name": product.category.and_then(|id| self.categories.get(&id)),
            "price": format!("{:.2}", product.price),
            "quantity": product.quantity,
            "image": product.image,
            "created_at": product.created_at,
            "updated_at": product.updated_at,
        })
    }

    pub fn products_json<'a>(&self, products: impl Iterator<Item = &'a StoredProduct>) -> Vec<Value> {
        products.map(|p| self.product_json(p)).collect()
    }

    pub fn category_json(&self, id: i64) -> Option<Value> {
        self.categories
            .get(&id)
            .map(|name| json!({ "id": id, "name": name }))
    }
}

impl StoredOrder {
    /// Staff listing shape.
    pub fn staff_json(&self) -> Value {
        json!({
            "id": self.id,
            "customer": self.username,
            "product_name": self.product_name,
            "quantity": self.quantity,
            "total_price": self.total.to_f64(),
            "status": self.status,
            "date": self.date,
            "phone": self.phone,
            "address": self.address,
        })
    }

    /// Customer listing shape: no customer or delivery details.
    pub fn customer_json(&self) -> Value {
        json!({
            "id": self.id,
            "product_name": self.product_name,
            "quantity": self.quantity,
            "total_price": self.total.to_f64(),
            "status": self.status,
            "date": self.date,
        })
    }
}

pub fn now() -> String {
    Utc::now().to_rfc3339()
}
