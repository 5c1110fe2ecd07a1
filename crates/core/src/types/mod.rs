//! Core types for the Vunjabei shop.
//!
//! This module provides type-safe wrappers for the shop's domain concepts.

pub mod account;
pub mod catalog;
pub mod id;
pub mod order;
pub mod price;
pub mod session;
pub mod status;

pub use account::{AccountError, Email, Username};
pub use catalog::{Category, Product};
pub use id::*;
pub use order::{Order, PlacedOrder};
pub use price::{Price, PriceError};
pub use session::{Role, Session};
pub use status::*;
