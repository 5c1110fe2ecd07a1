//! Vunjabei Core - Shared domain library.
//!
//! This crate provides the types and rules used by every Vunjabei component:
//! - `client` - Async client for the shop's REST API
//! - `cli` - Terminal front-end for customers and staff
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Role checks and order status rules live here so that every
//! front-end evaluates them the same way.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, accounts, sessions, catalog and order records
//! - [`access`] - Route table and role-gated navigation decisions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::{AccessDecision, Navigation, Resolution, Route};
pub use types::*;
