//! Command implementations.
//!
//! Each screen-like command first asks the access controller whether its
//! route renders for the current session (see [`App::enter`]).

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod orders;

use std::io::{BufRead, Write};

use secrecy::SecretString;
use thiserror::Error;
use vunjabei_client::{
    ApiClient, ClientConfig, ClientError, ConfigError, FileStorage, Loadable, Mounted,
    SessionStore,
};
use vunjabei_core::{Role, Route, Session, access};

use crate::render;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    /// The access controller sent the session elsewhere.
    #[error("{requested} is not available for this session (go to {landing})")]
    Redirected { requested: String, landing: String },

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Aborted(String),
}

/// Shared command context.
pub struct App {
    pub api: ApiClient,
    pub sessions: SessionStore,
}

impl App {
    /// Build the context from the environment and resume the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let api = ApiClient::new(&config)?;
        let sessions = SessionStore::open(api.clone(), FileStorage::new(config.session_file()));
        tracing::debug!(base_url = %config.api_base_url, "Client configured");
        Ok(Self { api, sessions })
    }

    /// Enter a screen. Returns the session it renders for.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Redirected` when navigation lands anywhere but
    /// `route`.
    pub fn enter(&self, route: Route) -> Result<Session, CliError> {
        let session = self.sessions.current();
        let requested = route.path();
        let navigation = access::navigate(session.as_ref(), &requested);

        match session {
            Some(session) if navigation.route == route => Ok(session),
            _ => {
                tracing::debug!(%requested, landed = %navigation.route.path(), "Navigation redirected");
                Err(CliError::Redirected {
                    requested,
                    landing: navigation.route.path(),
                })
            }
        }
    }

    /// Enter the staff screen for staff sessions, else the customer one.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Redirected` when signed out.
    pub fn enter_either(&self, staff: Route, customer: Route) -> Result<Session, CliError> {
        match self.sessions.current().map(|s| s.role) {
            Some(Role::Staff) => self.enter(staff),
            _ => self.enter(customer),
        }
    }
}

/// Run a fetch for a screen, showing the loading line while it runs.
///
/// # Errors
///
/// Returns the fetch's error.
pub async fn load<T>(
    what: &str,
    fetch: impl Future<Output = vunjabei_client::Result<T>>,
) -> Result<T, CliError> {
    let view = Mounted::new();
    let token = view.token();
    let mut state = Loadable::Loading;
    render::loading(what, &state);

    let result = fetch.await;
    token.deliver(result, |result| state = Loadable::from(result));

    match state {
        Loadable::Ready(value) => Ok(value),
        Loadable::Failed(err) => Err(err.into()),
        Loadable::Loading => Err(CliError::Aborted(format!("{what} did not load"))),
    }
}

/// Read a password, prompting on the terminal when none was given.
///
/// # Errors
///
/// Returns an error if standard input cannot be read.
pub fn password(given: Option<String>, label: &str) -> Result<SecretString, CliError> {
    if let Some(password) = given {
        return Ok(SecretString::from(password));
    }
    let line = prompt(&format!("{label}: "))?;
    Ok(SecretString::from(line))
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
///
/// # Errors
///
/// Returns an error if standard input cannot be read.
pub fn confirm(question: &str) -> Result<bool, CliError> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn prompt(text: &str) -> Result<String, CliError> {
    let mut stderr = std::io::stderr();
    stderr.write_all(text.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
