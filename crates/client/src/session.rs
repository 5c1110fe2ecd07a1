//! Session store: the single owner of the authenticated identity.
//!
//! The store persists the session (and the backend's session cookie) through a
//! [`SessionStorage`] so a later process resumes where this one stopped, and
//! publishes every change on a `tokio::sync::watch` channel.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;
use vunjabei_core::{AccountError, Email, Role, Session, Username};

use crate::api::ApiClient;
use crate::error::{ClientError, Result};

/// Errors from reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum SessionStorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where the persisted session record lives.
pub trait SessionStorage: Send + Sync {
    /// Raw record, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    fn load(&self) -> std::result::Result<Option<String>, SessionStorageError>;

    /// Replace the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, record: &str) -> std::result::Result<(), SessionStorageError>;

    /// Remove the stored record. Removing a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    fn clear(&self) -> std::result::Result<(), SessionStorageError>;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionStorageError {
        SessionStorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> std::result::Result<Option<String>, SessionStorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, record: &str) -> std::result::Result<(), SessionStorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, record).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> std::result::Result<(), SessionStorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory storage, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<String>>,
}

impl MemoryStorage {
    /// Storage pre-filled with a raw record.
    #[must_use]
    pub fn with_contents(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }

    /// The record currently stored.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> std::result::Result<Option<String>, SessionStorageError> {
        Ok(self.contents())
    }

    fn save(&self, record: &str) -> std::result::Result<(), SessionStorageError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.to_string());
        Ok(())
    }

    fn clear(&self) -> std::result::Result<(), SessionStorageError> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

impl<S: SessionStorage + ?Sized> SessionStorage for std::sync::Arc<S> {
    fn load(&self) -> std::result::Result<Option<String>, SessionStorageError> {
        (**self).load()
    }

    fn save(&self, record: &str) -> std::result::Result<(), SessionStorageError> {
        (**self).save(record)
    }

    fn clear(&self) -> std::result::Result<(), SessionStorageError> {
        (**self).clear()
    }
}

/// On-disk session record.
///
/// Older records carried `is_staff` instead of `role`; both are read, only
/// `role` is written.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    username: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default, skip_serializing)]
    is_staff: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credentials: Option<String>,
}

impl PersistedSession {
    fn into_parts(self) -> Option<(Session, Option<String>)> {
        if self.username.trim().is_empty() {
            return None;
        }
        let role = self.role.or_else(|| self.is_staff.map(Role::from_staff_flag))?;
        Some((Session::new(self.username, role), self.credentials))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginReply {
    username: String,
    #[serde(default)]
    is_staff: bool,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterReply {
    #[serde(default, alias = "success")]
    message: Option<String>,
}

/// A validated account registration.
#[derive(Debug)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: SecretString,
}

impl Registration {
    /// Validate registration input.
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email is malformed, the password
    /// is blank, or the confirmation differs from the password.
    pub fn new(
        username: &str,
        email: &str,
        password: SecretString,
        confirmation: &SecretString,
    ) -> std::result::Result<Self, AccountError> {
        let username = Username::parse(username)?;
        let email = Email::parse(email)?;
        if password.expose_secret().trim().is_empty() {
            return Err(AccountError::EmptyPassword);
        }
        if password.expose_secret() != confirmation.expose_secret() {
            return Err(AccountError::PasswordMismatch);
        }
        Ok(Self {
            username,
            email,
            password,
        })
    }
}

/// Owner of the current session.
pub struct SessionStore {
    api: ApiClient,
    storage: Box<dyn SessionStorage>,
    state: watch::Sender<Option<Session>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Open the store, resuming the persisted session if there is one.
    ///
    /// A corrupt record is discarded; the store then starts signed out.
    pub fn open(api: ApiClient, storage: impl SessionStorage + 'static) -> Self {
        let storage: Box<dyn SessionStorage> = Box::new(storage);
        let session = match restore(&*storage) {
            Ok(Some((session, credentials))) => {
                if let Some(cookies) = credentials {
                    api.restore_credentials(&cookies);
                }
                tracing::debug!(username = %session.username, role = %session.role, "Resumed session");
                Some(session)
            }
            Ok(None) => None,
            Err(reason) => {
                tracing::warn!(%reason, "Discarding unreadable session record");
                if let Err(e) = storage.clear() {
                    tracing::warn!(error = %e, "Failed to remove session record");
                }
                None
            }
        };

        Self {
            api,
            storage,
            state: watch::channel(session).0,
        }
    }

    /// The active session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every login and logout.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// The API client this store authenticates.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Authenticate with the backend and make the result the active session.
    ///
    /// `identifier` may be a username or an email; the backend resolves it.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidInput` if either field is blank
    /// - `ClientError::Auth` with the backend's message if the credentials
    ///   are rejected
    /// - `ClientError::Unreachable` if the backend cannot be reached
    /// - `ClientError::Session` if the session cannot be persisted
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &SecretString) -> Result<Session> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.expose_secret().trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Username/Email and password are required.".to_string(),
            ));
        }

        let request = LoginRequest {
            username: identifier,
            password: password.expose_secret(),
        };
        let reply: LoginReply = self
            .api
            .send_json(Method::POST, "login/", &request)
            .await
            .map_err(|e| match e {
                ClientError::Validation { message, .. } | ClientError::NotFound(message) => {
                    ClientError::Auth(message)
                }
                other => other,
            })?;

        let session = Session::new(reply.username, Role::from_staff_flag(reply.is_staff));

        if let Err(e) = self.persist(&session) {
            self.api.clear_credentials();
            return Err(e.into());
        }

        self.state.send_replace(Some(session.clone()));
        tracing::info!(username = %session.username, role = %session.role, "Logged in");
        Ok(session)
    }

    /// Register a customer account. Does not sign in.
    ///
    /// Returns the backend's confirmation text.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` with the backend's message (for
    /// example a taken username), or a transport error.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<String> {
        let message = self.submit_registration("register/", registration).await?;
        tracing::info!("Registered customer account");
        Ok(message)
    }

    /// Register a staff account. Requires a staff session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` if the current session is not staff (the
    /// backend enforces the same rule), plus the errors of [`Self::register`].
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register_staff(&self, registration: &Registration) -> Result<String> {
        if !self.current().is_some_and(|s| s.is_staff()) {
            return Err(ClientError::Auth("Admin access required.".to_string()));
        }
        let message = self
            .submit_registration("register-staff/", registration)
            .await?;
        tracing::info!("Registered staff account");
        Ok(message)
    }

    /// Sign out locally: forget the session, the stored record and the
    /// credential cookies.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Session` if the stored record cannot be removed.
    /// The in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<()> {
        let previous = self.state.send_replace(None);
        self.api.clear_credentials();
        if let Some(session) = previous {
            tracing::info!(username = %session.username, "Logged out");
        }
        self.storage.clear()?;
        Ok(())
    }

    async fn submit_registration(&self, path: &str, registration: &Registration) -> Result<String> {
        let request = RegisterRequest {
            username: registration.username.as_str(),
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
        };
        let reply: RegisterReply = self.api.send_json(Method::POST, path, &request).await?;
        Ok(reply
            .message
            .unwrap_or_else(|| "Registration successful. Please login.".to_string()))
    }

    fn persist(&self, session: &Session) -> std::result::Result<(), SessionStorageError> {
        let record = PersistedSession {
            username: session.username.clone(),
            role: Some(session.role),
            is_staff: None,
            credentials: self.api.export_credentials(),
        };
        self.storage.save(&serde_json::to_string(&record)?)
    }
}

/// Read the stored record. `Err` carries the reason a record was rejected.
fn restore(storage: &dyn SessionStorage) -> std::result::Result<Option<(Session, Option<String>)>, String> {
    let Some(raw) = storage.load().map_err(|e| e.to_string())? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Err("empty record".to_string());
    }
    let record: PersistedSession = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    record
        .into_parts()
        .map(Some)
        .ok_or_else(|| "record has no username or role".to_string())
}
