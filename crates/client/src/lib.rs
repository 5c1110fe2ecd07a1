//! Vunjabei client library.
//!
//! Async access to the shop's REST API for both customer and staff
//! front-ends.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the only component that talks to the network. It owns
//!   the base URL, the cookie credentials and the error mapping, and turns
//!   list responses into a [`Listing`] whatever shape the backend used.
//! - [`SessionStore`] owns the authenticated identity, persists it between
//!   runs and notifies subscribers when it changes.
//! - [`CatalogService`] and [`OrderService`] build on the API client.
//! - [`guards`] holds the submission, mount and loading-state helpers views
//!   use around requests.
//!
//! # Example
//!
//! ```rust,ignore
//! use vunjabei_client::{ApiClient, ClientConfig, FileStorage, SessionStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = ApiClient::new(&config)?;
//! let sessions = SessionStore::open(api.clone(), FileStorage::new(config.session_file()));
//!
//! let session = sessions.login("alice", &password).await?;
//! let products = vunjabei_client::CatalogService::new(api).list_products().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guards;
pub mod orders;
pub mod session;

pub use api::{ApiClient, Health, Listing};
pub use catalog::{
    CatalogService, ConfirmedDeletion, Deletable, ImageUpload, PendingDeletion, ProductForm,
};
pub use config::{ClientConfig, ConfigError};
pub use dashboard::DashboardStats;
pub use error::{ClientError, ErrorKind, Result};
pub use guards::{Loadable, MountToken, Mounted, SubmitGuard, Submission};
pub use orders::{OrderBook, OrderService, PendingChange, PlaceOrder, Scope};
pub use session::{
    FileStorage, MemoryStorage, Registration, SessionStorage, SessionStorageError, SessionStore,
};
