//! Shared setup for the scenario tests.

#![allow(dead_code, clippy::unwrap_used)]

use secrecy::SecretString;
use tempfile::TempDir;
use vunjabei_client::{ApiClient, FileStorage, SessionStore};
use vunjabei_integration_tests::MockBackend;

pub const PASSWORD: &str = "Kanga#2024";

/// A running backend with one customer (`alice`) and one staff account
/// (`admin`).
pub struct Fixture {
    pub backend: MockBackend,
    pub state: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let backend = MockBackend::start().await.unwrap();
        backend.add_user("alice", "alice@example.com", PASSWORD, false);
        backend.add_user("admin", "admin@vunjabei.example", PASSWORD, true);
        Self {
            backend,
            state: tempfile::tempdir().unwrap(),
        }
    }

    /// A fresh client process: new HTTP client, session read from disk.
    pub fn open(&self) -> SessionStore {
        let config = self.backend.config(self.state.path()).unwrap();
        let api = ApiClient::new(&config).unwrap();
        SessionStore::open(api, FileStorage::new(config.session_file()))
    }

    /// Open a store and sign in as `username`.
    pub async fn signed_in(&self, username: &str) -> SessionStore {
        let sessions = self.open();
        sessions.login(username, &password()).await.unwrap();
        sessions
    }
}

pub fn password() -> SecretString {
    SecretString::from(PASSWORD.to_string())
}
